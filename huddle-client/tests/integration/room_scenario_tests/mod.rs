mod test_three_peer_mesh;
