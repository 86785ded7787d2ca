use ghost_putt_core::RoomCode;
use url::Url;

pub const ROOM_PARAM: &str = "room";

/// Room code carried by a shared link, if it has a valid one.
pub fn room_code_from_url(link: &str) -> Option<RoomCode> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == ROOM_PARAM)
        .and_then(|(_, value)| RoomCode::parse(&value).ok())
}

/// `base` with its `room` parameter set to `code`; other parameters and the
/// fragment are kept.
pub fn shareable_link(base: &str, code: &RoomCode) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != ROOM_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair(ROOM_PARAM, code.as_str());
    Ok(url.into())
}

/// `link` without its `room` parameter.
pub fn without_room_code(link: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(link)?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != ROOM_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if others.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(others);
    }
    Ok(url.into())
}
