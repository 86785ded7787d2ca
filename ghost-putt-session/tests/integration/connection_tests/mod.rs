mod test_handshake_deadline;
mod test_join_links_both_sides;
mod test_missing_host;
mod test_relay_outage;
mod test_wrong_room_code;
