mod test_broadcast_skips_connecting_peers;
