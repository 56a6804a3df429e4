/// Maximum number of `/`-separated parts carried into a normalized identifier
/// (kommune, gnr, bnr, fnr, snr).
const MAX_PARTS: usize = 5;

/// Convert an owner-file identifier (`3236/123/2`) into the form the
/// geokoding API expects (`3236-123/2`).
///
/// Identifiers with fewer than three parts pass through unchanged. Parts
/// beyond the fifth are dropped. Part contents are not validated.
pub fn normalize(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() < 3 {
        return raw.to_string();
    }

    let mut id = format!("{}-{}", parts[0], parts[1]);
    for part in parts.iter().take(MAX_PARTS).skip(2) {
        id.push('/');
        id.push_str(part);
    }
    id
}
