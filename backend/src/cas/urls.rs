//! Login and logout redirect URLs for a CAS provider.

use crate::cas::config::{CasConfigError, ProviderConfig};
use url::form_urlencoded::byte_serialize;

/// URL-encodes a single query parameter value.
pub fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// The service string registered with CAS for this login attempt.
///
/// The callback must send exactly this value when validating the ticket, so
/// both sides of the flow go through this helper.
pub fn service_for_return_url(
    config: &ProviderConfig,
    return_url: Option<&str>,
) -> Result<String, CasConfigError> {
    config.ensure_service_url()?;

    match return_url.filter(|url| !url.is_empty()) {
        Some(return_url) => {
            let separator = if config.service_url.contains('?') { '&' } else { '?' };
            Ok(format!(
                "{}{}returnUrl={}",
                config.service_url,
                separator,
                encode(return_url)
            ))
        }
        None => Ok(config.service_url.clone()),
    }
}

/// `${base_url}${login}?service=<service>`
pub fn build_login_url(
    config: &ProviderConfig,
    return_url: Option<&str>,
) -> Result<String, CasConfigError> {
    let service = service_for_return_url(config, return_url)?;
    Ok(format!(
        "{}{}?service={}",
        config.base_url,
        config.endpoints.login,
        encode(&service)
    ))
}

/// `${base_url}${logout}`, with `?service=<return_url>` only when one is given.
pub fn build_logout_url(
    config: &ProviderConfig,
    return_url: Option<&str>,
) -> Result<String, CasConfigError> {
    config.ensure_service_url()?;

    let base = format!("{}{}", config.base_url, config.endpoints.logout);
    Ok(match return_url.filter(|url| !url.is_empty()) {
        Some(return_url) => format!("{}?service={}", base, encode(return_url)),
        None => base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::config::tests::sample_config;
    use url::Url;

    fn query_pairs(raw: &str) -> Vec<(String, String)> {
        Url::parse(raw)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_login_url_without_return_url() {
        let config = sample_config("https://cas.example.com/cas");
        let url = build_login_url(&config, None).unwrap();

        assert_eq!(
            url,
            "https://cas.example.com/cas/login?service=https%3A%2F%2Fapp.example.com%2Fauth%2Fcas%2Fcorp%2Fcallback"
        );
        assert_eq!(
            query_pairs(&url),
            vec![("service".to_string(), config.service_url.clone())]
        );
    }

    #[test]
    fn test_login_url_embeds_return_url_in_service() {
        let config = sample_config("https://cas.example.com/cas");
        let url = build_login_url(&config, Some("/dashboard?tab=apps")).unwrap();

        let pairs = query_pairs(&url);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "service");
        assert_eq!(
            pairs[0].1,
            "https://app.example.com/auth/cas/corp/callback?returnUrl=%2Fdashboard%3Ftab%3Dapps"
        );

        let service = Url::parse(&pairs[0].1).unwrap();
        let return_url: Vec<_> = service.query_pairs().collect();
        assert_eq!(return_url[0].1, "/dashboard?tab=apps");
    }

    #[test]
    fn test_service_with_existing_query_uses_ampersand() {
        let mut config = sample_config("https://cas.example.com");
        config.service_url = "https://app.example.com/cb?provider=corp".to_string();

        let service = service_for_return_url(&config, Some("/home")).unwrap();
        assert_eq!(service, "https://app.example.com/cb?provider=corp&returnUrl=%2Fhome");
        assert_eq!(
            service_for_return_url(&config, Some("")).unwrap(),
            config.service_url
        );
    }

    #[test]
    fn test_logout_url() {
        let config = sample_config("https://cas.example.com/cas");

        let url = build_logout_url(&config, None).unwrap();
        assert_eq!(url, "https://cas.example.com/cas/logout");
        assert!(Url::parse(&url).unwrap().query().is_none());

        let url = build_logout_url(&config, Some("https://app.example.com/")).unwrap();
        assert_eq!(
            query_pairs(&url),
            vec![("service".to_string(), "https://app.example.com/".to_string())]
        );
    }

    #[test]
    fn test_invalid_service_url_is_a_configuration_error() {
        let mut config = sample_config("https://cas.example.com");
        config.service_url = "not a url".to_string();

        assert!(matches!(
            build_login_url(&config, None),
            Err(CasConfigError::InvalidServiceUrl { .. })
        ));
        assert!(build_logout_url(&config, None).is_err());
    }
}
