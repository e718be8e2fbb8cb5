// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::errors::FetchError;
use crate::traits::ArtifactFetcher;

/// Downloads artifacts over HTTP(S) with `reqwest`.
///
/// The body is streamed into `<dest>.part` and renamed into place only once
/// complete, so an interrupted download never looks like a finished artifact.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| FetchError::Write { path, source }
        };

        let mut response = self.client.get(url).send().await.map_err(http_err)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let partial = partial_path(dest);
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(write_err(&partial))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(http_err)? {
            file.write_all(&chunk).await.map_err(write_err(&partial))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err(&partial))?;
        drop(file);

        tokio::fs::rename(&partial, dest)
            .await
            .map_err(write_err(dest))?;
        Ok(written)
    }
}
