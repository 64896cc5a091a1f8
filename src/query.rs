use crate::error::FetchError;
use std::fmt;

/// What the user typed to pick an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    Id(u64),
    Handle(String),
}

impl UserQuery {
    /// Parse a numeric id, an `@handle`, or a profile URL ending in either.
    /// Expected inputs:
    /// 316642663
    /// @some_tag
    /// https://www.spooncast.net/jp/profile/316642663
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FetchError::InvalidQuery("empty user id".to_string()));
        }

        let token = if input.contains('/') {
            last_path_segment(input)
                .ok_or_else(|| FetchError::InvalidQuery(format!("no user in {}", input)))?
        } else {
            input
        };

        if let Some(handle) = token.strip_prefix('@') {
            if handle.is_empty() {
                return Err(FetchError::InvalidQuery("empty handle".to_string()));
            }
            return Ok(UserQuery::Handle(handle.to_string()));
        }

        if token.chars().all(|c| c.is_ascii_digit()) {
            return token
                .parse::<u64>()
                .map(UserQuery::Id)
                .map_err(|e| FetchError::InvalidQuery(format!("{}: {}", token, e)));
        }

        Ok(UserQuery::Handle(token.to_string()))
    }
}

impl fmt::Display for UserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserQuery::Id(id) => write!(f, "{}", id),
            UserQuery::Handle(handle) => write!(f, "@{}", handle),
        }
    }
}

fn last_path_segment(url: &str) -> Option<&str> {
    let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
    path.split('/').filter(|s| !s.is_empty()).last()
}
