// src/platforms/generic.rs
use crate::platforms::PlatformSpec;
use crate::session::Fetcher;
use crate::types::{FootprintError, ProbeResult};

/// Status-code existence check: 200 means the profile page exists.
pub async fn check_existence(
    spec: &PlatformSpec,
    variation: &str,
    fetcher: &dyn Fetcher,
) -> Result<ProbeResult, FootprintError> {
    let url = spec.profile_url(variation);
    let page = fetcher.fetch(&url).await?;

    if page.is_ok() {
        Ok(ProbeResult::found(url))
    } else {
        Ok(ProbeResult::missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::types::Config;

    #[tokio::test]
    async fn test_existing_profile() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/jdoe")
            .with_status(200)
            .with_body("<html>profile</html>")
            .create_async()
            .await;

        let spec = PlatformSpec::generic("Reddit", &format!("{}/user/{{username}}", server.url()));
        let session = Session::new(&Config::default()).unwrap();
        let result = check_existence(&spec, "jdoe", &session).await.unwrap();

        assert_eq!(result, ProbeResult::found(format!("{}/user/jdoe", server.url())));
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/nobody")
            .with_status(404)
            .create_async()
            .await;

        let spec = PlatformSpec::generic("Reddit", &format!("{}/user/{{username}}", server.url()));
        let session = Session::new(&Config::default()).unwrap();
        let result = check_existence(&spec, "nobody", &session).await.unwrap();

        assert_eq!(result, ProbeResult::missing());
    }
}
