use crate::error::CoreError;
use crate::types::SourceCoordinate;

const DEFAULT_BRANCH: &str = "main";

/// Parse a repository URL into a [`SourceCoordinate`].
///
/// Accepted shapes:
///
/// ```text
/// https://<host>/<owner>/<repo>[.git]
/// https://<host>/<owner>/<repo>/tree/<branch>[/<subpath>...]
/// ```
///
/// The branch is a single path segment; everything after it is the subpath.
pub fn parse_source(url: &str) -> Result<SourceCoordinate, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidSource {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches('/');

    let (_, rest) = trimmed
        .split_once("://")
        .ok_or_else(|| invalid("missing scheme"))?;

    // Drop the host; what remains is the repository path.
    let parts: Vec<&str> = rest.split('/').skip(1).collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(invalid("missing owner/repo"));
    }

    let owner = parts[0].to_string();
    let repo = parts[1].to_string();

    let (branch, subpath) = if parts.len() > 2 && parts[2] == "tree" {
        let branch = parts
            .get(3)
            .filter(|b| !b.is_empty())
            .map(|b| b.to_string())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let subpath = parts
            .get(4..)
            .map(|rest| {
                rest.iter()
                    .filter(|segment| !segment.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        (branch, subpath)
    } else {
        (DEFAULT_BRANCH.to_string(), String::new())
    };

    Ok(SourceCoordinate {
        owner,
        repo,
        branch,
        subpath,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://host/o/r", "o", "r", "main", "")]
    #[case("https://host/o/r/", "o", "r", "main", "")]
    #[case("https://github.com/o/r.git", "o", "r", "main", "")]
    #[case("https://github.com/o/r.git/", "o", "r", "main", "")]
    #[case("https://host/o/r/tree/dev", "o", "r", "dev", "")]
    #[case("https://host/o/r/tree/dev/sub/dir", "o", "r", "dev", "sub/dir")]
    #[case("https://host/o/r/tree/dev/sub/dir/", "o", "r", "dev", "sub/dir")]
    #[case("http://github.com/anthropics/skills/tree/main/pdf", "anthropics", "skills", "main", "pdf")]
    fn parses_coordinates(
        #[case] url: &str,
        #[case] owner: &str,
        #[case] repo: &str,
        #[case] branch: &str,
        #[case] subpath: &str,
    ) {
        let coord = parse_source(url).unwrap();
        assert_eq!(coord.owner, owner);
        assert_eq!(coord.repo, repo);
        assert_eq!(coord.branch, branch);
        assert_eq!(coord.subpath, subpath);
    }

    #[rstest]
    #[case("https://host/o")]
    #[case("https://host/")]
    #[case("https://host")]
    #[case("not a url")]
    #[case("")]
    fn rejects_short_urls(#[case] url: &str) {
        let err = parse_source(url).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSource { .. }), "got: {err}");
    }

    #[test]
    fn error_message_names_offending_url() {
        let err = parse_source("https://host/o").unwrap_err();
        assert!(err.to_string().contains("https://host/o"));
    }

    #[test]
    fn tree_without_branch_defaults_to_main() {
        let coord = parse_source("https://host/o/r/tree").unwrap();
        assert_eq!(coord.branch, "main");
        assert_eq!(coord.subpath, "");
    }
}
