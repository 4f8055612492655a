//! # Client Identity
//!
//! The contract records owners by the common name of the submitting
//! client's X.509 id, e.g.
//! `x509::CN=Farmer42,OU=org1+OU=client+OU=department1::CN=ca.org1.example.com,...`.

const CN_MARKER: &str = "x509::CN=";
const CN_END: char = ',';

/// Extract the user common name from an X.509 client id.
///
/// Takes the text between `x509::CN=` and the first `,` in the whole
/// string. Returns an empty string when either marker is missing or the
/// comma comes before the end of the prefix.
pub fn extract_common_name(client_id: &str) -> String {
    let Some(start) = client_id.find(CN_MARKER) else {
        return String::new();
    };
    let Some(end) = client_id.find(CN_END) else {
        return String::new();
    };
    let start = start + CN_MARKER.len();
    if start >= end {
        return String::new();
    }
    client_id[start..end].to_string()
}
