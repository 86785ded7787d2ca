mod test_disconnect_is_idempotent;
mod test_link_failure_is_contained;
mod test_state_broadcast_stops;
