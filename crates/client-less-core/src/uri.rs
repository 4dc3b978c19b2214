//! URL construction from a base URL, a path template and bindings.

use http::Uri;
use url::Url;

use crate::bind::{PathVariables, QueryParams};
use crate::error::UrlBuildError;
use crate::template::{Token, tokenize};

/// Expands a path template against a base URL.
///
/// Implementations substitute path variables, percent-encode, and fail
/// loudly on malformed templates instead of truncating them.
pub trait UrlBuilder: Send + Sync {
    fn build(
        &self,
        base: &Url,
        template: &str,
        query: &QueryParams,
        path_variables: &PathVariables,
    ) -> Result<Uri, UrlBuildError>;
}

/// Default [`UrlBuilder`].
///
/// - Template segments are appended to the base URL's path; a trailing slash
///   on the base is dropped first.
/// - Each expanded segment is percent-encoded as a whole, so a `/` inside a
///   value stays within its segment (`%2F`).
/// - Path variables bound without a value expand to the empty string.
/// - Query pairs are form-urlencoded and appended in order after any query
///   already present on the base URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateUrlBuilder;

impl UrlBuilder for TemplateUrlBuilder {
    fn build(
        &self,
        base: &Url,
        template: &str,
        query: &QueryParams,
        path_variables: &PathVariables,
    ) -> Result<Uri, UrlBuildError> {
        let segments = expand_segments(template, path_variables)?;

        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| UrlBuildError::CannotBeABase(base.to_string()))?;
            path.pop_if_empty();
            path.extend(segments.iter().map(String::as_str));
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.iter() {
                pairs.append_pair(name, value);
            }
        }

        url.as_str()
            .parse::<Uri>()
            .map_err(|err| UrlBuildError::InvalidUri {
                url: url.to_string(),
                message: err.to_string(),
            })
    }
}

/// Expand `template` into unencoded path segments.
///
/// Empty segments from repeated slashes are dropped; a segment holding a
/// placeholder is kept even when its value is empty. Segments equal to `.` or
/// `..` are rejected.
pub fn expand_segments(
    template: &str,
    path_variables: &PathVariables,
) -> Result<Vec<String>, UrlBuildError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut has_variable = false;
    let mut offset = 0;

    for token in tokenize(template) {
        match token {
            Token::Literal(text) => {
                if let Some(position) = text.find(['{', '}']) {
                    return Err(UrlBuildError::MalformedTemplate {
                        template: template.to_string(),
                        position: offset + position,
                    });
                }
                let mut pieces = text.split('/');
                if let Some(first) = pieces.next() {
                    current.push_str(first);
                }
                for piece in pieces {
                    if !current.is_empty() || has_variable {
                        segments.push(std::mem::take(&mut current));
                    }
                    has_variable = false;
                    current.push_str(piece);
                }
                offset += text.len();
            }
            Token::Variable(name) => {
                let value = path_variables
                    .get(name)
                    .ok_or_else(|| UrlBuildError::MissingVariable {
                        name: name.to_string(),
                    })?;
                current.push_str(value.unwrap_or_default());
                has_variable = true;
                offset += name.len() + 2;
            }
        }
    }

    if !current.is_empty() || has_variable {
        segments.push(current);
    }
    if let Some(segment) = segments.iter().find(|s| matches!(s.as_str(), "." | "..")) {
        return Err(UrlBuildError::DotSegment {
            segment: segment.clone(),
        });
    }
    Ok(segments)
}
