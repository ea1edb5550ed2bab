/// Confirmation link handed to the requester
///
/// `{frontend_url}/verify-booking?token=..&doctorId=..`; a trailing slash on
/// the base URL is ignored.
pub fn confirmation_link(frontend_url: &str, provider_id: i64, token: &str) -> String {
    format!(
        "{}/verify-booking?token={}&doctorId={}",
        frontend_url.trim_end_matches('/'),
        token,
        provider_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_shape() {
        assert_eq!(
            confirmation_link("http://localhost:3000/", 7, "abc"),
            "http://localhost:3000/verify-booking?token=abc&doctorId=7"
        );
    }
}
