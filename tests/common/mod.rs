//! In-process stand-in for a registry's token, manifest and blob endpoints

#![allow(dead_code)]

use revprobe::{
    manifest::media_types, ContentDigest, ImageCoordinates, RefreshToken, Registry, Repository,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, Request, ResponseTemplate, Times,
};

pub const REPOSITORY: &str = "raptor/frontend";
pub const REFRESH_TOKEN: &str = "refresh-me";
pub const ACCESS_TOKEN: &str = "pull-raptor-frontend";

pub fn digest(c: char) -> String {
    format!("sha256:{}", c.to_string().repeat(64))
}

pub fn refresh_token() -> RefreshToken {
    RefreshToken::new(REFRESH_TOKEN.to_owned()).unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct FakeRegistry {
    pub server: MockServer,
}

impl FakeRegistry {
    pub async fn start() -> Self {
        init_logging();
        FakeRegistry {
            server: MockServer::start().await,
        }
    }

    /// Dotless host, so the client talks plain http to it
    pub fn host(&self) -> String {
        format!("localhost:{}", self.server.address().port())
    }

    pub fn registry(&self) -> Registry {
        self.host().parse().unwrap()
    }

    pub fn image(&self, digest: &str) -> ImageCoordinates {
        ImageCoordinates::new(
            self.registry(),
            Repository::parse(REPOSITORY).unwrap(),
            ContentDigest::parse(digest).unwrap(),
        )
    }

    /// Token endpoint that only accepts [REFRESH_TOKEN], rejecting anything
    /// else with a 401
    pub async fn token_endpoint(&self, expected_exchanges: u64) {
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains(
                format!("service={}", self.host().replace(':', "%3A")).as_str(),
            ))
            .and(body_string_contains("scope=repository%3Araptor%2Ffrontend%3Apull"))
            .and(body_string_contains(
                format!("refresh_token={}", REFRESH_TOKEN).as_str(),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": ACCESS_TOKEN })),
            )
            .expect(expected_exchanges)
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({
                    "errors": [{ "code": "UNAUTHORIZED", "message": "invalid refresh token" }]
                })),
            )
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    pub async fn manifest_raw(
        &self,
        digest: &str,
        media_type: &str,
        body: Vec<u8>,
        expect: impl Into<Times>,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/{}/manifests/{}", REPOSITORY, digest).as_str()))
            .and(header(
                "authorization",
                format!("Bearer {}", ACCESS_TOKEN).as_str(),
            ))
            .and(|req: &Request| {
                req.headers
                    .get("accept")
                    .and_then(|value| value.to_str().ok())
                    .map_or(false, |accept| {
                        accept.contains(media_types::OCI_INDEX)
                            && accept.contains(media_types::DOCKER_MANIFEST_LIST)
                            && accept.contains(media_types::OCI_MANIFEST)
                            && accept.contains(media_types::DOCKER_MANIFEST)
                    })
            })
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, media_type))
            .expect(expect)
            .mount(&self.server)
            .await;
    }

    pub async fn image_manifest(&self, digest: &str, config_digest: &str) {
        self.manifest_raw(
            digest,
            media_types::OCI_MANIFEST,
            image_manifest(config_digest),
            1..,
        )
        .await;
    }

    pub async fn index(&self, digest: &str, entries: &[String]) {
        self.manifest_raw(
            digest,
            media_types::OCI_INDEX,
            index_manifest(entries),
            1..,
        )
        .await;
    }

    pub async fn blob_raw(&self, digest: &str, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/{}/blobs/{}", REPOSITORY, digest).as_str()))
            .and(header(
                "authorization",
                format!("Bearer {}", ACCESS_TOKEN).as_str(),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body, "application/octet-stream"),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn config_blob(&self, digest: &str, labels: Value) {
        self.blob_raw(digest, config_blob(labels)).await;
    }
}

pub fn image_manifest(config_digest: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "schemaVersion": 2,
        "mediaType": media_types::OCI_MANIFEST,
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "size": 1469,
            "digest": config_digest,
        },
        "layers": [{
            "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
            "size": 2814446,
            "digest": digest('e'),
        }],
    }))
    .unwrap()
}

pub fn index_manifest(entries: &[String]) -> Vec<u8> {
    let manifests: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            json!({
                "mediaType": media_types::OCI_MANIFEST,
                "size": 1024,
                "digest": entry,
                "platform": {
                    "architecture": if i == 0 { "amd64" } else { "arm64" },
                    "os": "linux",
                },
            })
        })
        .collect();
    serde_json::to_vec(&json!({
        "schemaVersion": 2,
        "mediaType": media_types::OCI_INDEX,
        "manifests": manifests,
    }))
    .unwrap()
}

pub fn config_blob(labels: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "architecture": "amd64",
        "os": "linux",
        "config": {
            "Env": ["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"],
            "Cmd": ["node", "server.js"],
            "Labels": labels,
        },
        "rootfs": { "type": "layers", "diff_ids": [] },
    }))
    .unwrap()
}
