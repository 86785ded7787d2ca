mod test_broadcast_reaches_joiner;
mod test_periodic_state_broadcast;
mod test_send_to_peer;
