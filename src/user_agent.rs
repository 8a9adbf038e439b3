//! Default User-Agent for download requests.

/// Default User-Agent for download requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("rget/{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_is_name_and_version() {
        assert_eq!(
            default_user_agent(),
            format!("rget/{}", env!("CARGO_PKG_VERSION"))
        );
    }
}
