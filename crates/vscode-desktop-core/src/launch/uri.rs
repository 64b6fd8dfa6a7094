use url::form_urlencoded;

use super::LaunchParams;

/// Handler registered by the Coder Remote extension for VS Code.
pub const LAUNCH_URI_PREFIX: &str = "vscode://coder.coder-remote/open";

/// Build the deep link handed to VS Code.
///
/// Parameters are emitted in a fixed order (`owner`, `workspace`, `url`,
/// `token`, then `agent` and `folder` when present) and values use
/// `application/x-www-form-urlencoded` encoding.
pub fn launch_uri(params: &LaunchParams, origin: &str, token: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("owner", params.owner())
        .append_pair("workspace", params.workspace())
        .append_pair("url", origin)
        .append_pair("token", token);
    if let Some(agent) = params.agent() {
        query.append_pair("agent", agent);
    }
    if let Some(folder) = params.folder() {
        query.append_pair("folder", folder);
    }
    format!("{LAUNCH_URI_PREFIX}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    const ORIGIN: &str = "https://coder.example.com";

    fn params() -> LaunchParams {
        LaunchParams::new("alice", "devbox").unwrap()
    }

    fn keys(uri: &str) -> Vec<String> {
        Url::parse(uri)
            .unwrap()
            .query_pairs()
            .map(|(key, _)| key.into_owned())
            .collect()
    }

    #[test]
    fn folder_only_matches_known_uri() {
        let params = params().with_folder(Some("/home/alice/proj".into()));
        assert_eq!(
            launch_uri(&params, ORIGIN, "tok123"),
            "vscode://coder.coder-remote/open?owner=alice&workspace=devbox&url=https%3A%2F%2Fcoder.example.com&token=tok123&folder=%2Fhome%2Falice%2Fproj"
        );
    }

    #[test]
    fn mandatory_parameters_only() {
        let uri = launch_uri(&params(), ORIGIN, "tok123");
        assert_eq!(keys(&uri), ["owner", "workspace", "url", "token"]);
    }

    #[test]
    fn agent_follows_token() {
        let params = params().with_agent(Some("main".into()));
        let uri = launch_uri(&params, ORIGIN, "tok123");
        assert_eq!(keys(&uri), ["owner", "workspace", "url", "token", "agent"]);
        assert!(uri.ends_with("&token=tok123&agent=main"));
    }

    #[test]
    fn agent_precedes_folder() {
        let params = params()
            .with_folder(Some("/src".into()))
            .with_agent(Some("main".into()));
        let uri = launch_uri(&params, ORIGIN, "tok123");
        assert_eq!(
            keys(&uri),
            ["owner", "workspace", "url", "token", "agent", "folder"]
        );
    }

    #[test]
    fn reserved_characters_round_trip() {
        let params = LaunchParams::new("a b&c=d", "ws?#%")
            .unwrap()
            .with_folder(Some("/home/me/my project+x".into()));
        let uri = launch_uri(&params, ORIGIN, "t/k=");
        assert!(uri.contains("owner=a+b%26c%3Dd&"));

        let parsed = Url::parse(&uri).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0].1, "a b&c=d");
        assert_eq!(pairs[1].1, "ws?#%");
        assert_eq!(pairs[2].1, ORIGIN);
        assert_eq!(pairs[3].1, "t/k=");
        assert_eq!(pairs[4].1, "/home/me/my project+x");
    }

    #[test]
    fn same_inputs_same_uri() {
        let params = params().with_agent(Some("main".into()));
        assert_eq!(
            launch_uri(&params, ORIGIN, "fixed"),
            launch_uri(&params, ORIGIN, "fixed")
        );
    }
}
