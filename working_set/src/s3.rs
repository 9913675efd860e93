//! Creation of [`object_store::ObjectStore`]s for input and output locations, including
//! bridging AWS credentials into the S3 store.
/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use std::{
    collections::{HashMap, hash_map::Entry},
    future::ready,
    pin::Pin,
    sync::{Arc, Mutex},
};

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use color_eyre::eyre::eyre;
use futures::Future;
use log::debug;
use object_store::{
    ClientOptions, CredentialProvider, Error, ObjectStore,
    aws::{AmazonS3, AmazonS3Builder, AwsCredential},
    local::LocalFileSystem,
};
use url::Url;

/// Bridges AWS credentials obtained from [`aws_config`] to the [`CredentialProvider`]
/// trait in [`object_store`].
#[derive(Debug)]
struct CredentialsFromConfigProvider(Arc<AwsCredential>);

impl CredentialsFromConfigProvider {
    pub fn new(creds: &aws_credential_types::Credentials) -> CredentialsFromConfigProvider {
        Self(Arc::new(AwsCredential {
            key_id: creds.access_key_id().to_owned(),
            secret_key: creds.secret_access_key().to_owned(),
            token: creds.session_token().map(ToOwned::to_owned),
        }))
    }
}

impl CredentialProvider for CredentialsFromConfigProvider {
    type Credential = AwsCredential;

    fn get_credential<'a, 'async_trait>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<Self::Credential>, Error>> + Send + 'async_trait>>
    where
        'a: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(ready(Ok(self.0.clone())))
    }
}

/// Create an S3 store builder for the given region with the provided credentials.
#[must_use]
pub fn config_for_s3_module(
    creds: &aws_credential_types::Credentials,
    region: &Region,
) -> AmazonS3Builder {
    AmazonS3Builder::from_env()
        .with_credentials(Arc::new(CredentialsFromConfigProvider::new(creds)))
        .with_client_options(ClientOptions::default().with_timeout_disabled())
        .with_region(region.as_ref())
}

/// Create an S3 store builder from the default AWS credential provider chain.
///
/// # Errors
/// If no credentials can be found in any of the standard places, or no default
/// region is set.
pub async fn default_creds_store() -> color_eyre::Result<AmazonS3Builder> {
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let creds = config
        .credentials_provider()
        .ok_or(eyre!("Couldn't retrieve AWS credentials"))?
        .provide_credentials()
        .await?;
    let region = config
        .region()
        .ok_or(eyre!("Couldn't retrieve AWS region"))?;
    Ok(config_for_s3_module(&creds, region))
}

fn extract_bucket(src: &Url) -> color_eyre::Result<String> {
    src.host_str()
        .filter(|h| !h.is_empty())
        .map(ToOwned::to_owned)
        .ok_or(eyre!("invalid S3 bucket name"))
}

/// Creates and caches [`ObjectStore`]s by URL.
///
/// `file` URLs get a [`LocalFileSystem`], `s3` URLs an [`AmazonS3`] store per bucket.
/// Any other scheme is an error.
#[derive(Debug)]
pub struct ObjectStoreFactory {
    s3_config: Option<AmazonS3Builder>,
    store_map: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreFactory {
    #[must_use]
    pub fn new(s3_config: Option<AmazonS3Builder>) -> Self {
        Self {
            s3_config,
            store_map: Mutex::new(HashMap::new()),
        }
    }

    /// S3 stores are bucket specific so the bucket forms part of their key.
    fn make_cache_key_for(url: &Url) -> color_eyre::Result<String> {
        match url.scheme() {
            "s3" => Ok(format!("s3://{}", extract_bucket(url)?)),
            scheme => Ok(scheme.to_owned()),
        }
    }

    /// Retrieves the store for a URL, creating it on first use.
    ///
    /// # Errors
    /// If the scheme is unsupported, or an S3 URL is given and no S3 configuration
    /// was provided.
    pub fn get_object_store(&self, src: &Url) -> color_eyre::Result<Arc<dyn ObjectStore>> {
        let key = ObjectStoreFactory::make_cache_key_for(src)?;
        let mut stores = self
            .store_map
            .lock()
            .map_err(|_| eyre!("object store cache lock poisoned"))?;
        match stores.entry(key) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let store = self.make_object_store(src)?;
                debug!("Created object store for {}", vacant.key());
                Ok(vacant.insert(store).clone())
            }
        }
    }

    fn make_object_store(&self, src: &Url) -> color_eyre::Result<Arc<dyn ObjectStore>> {
        match src.scheme() {
            "s3" => Ok(Arc::new(self.connect_s3(src)?)),
            "file" => Ok(Arc::new(LocalFileSystem::new())),
            scheme => Err(eyre!("no object store for URL scheme \"{scheme}\" in {src}")),
        }
    }

    fn connect_s3(&self, src: &Url) -> color_eyre::Result<AmazonS3> {
        match &self.s3_config {
            Some(config) => Ok(config
                .clone()
                .with_bucket_name(extract_bucket(src)?)
                .build()?),
            None => Err(eyre!(
                "Can't create AWS S3 object_store: no credentials provided to ObjectStoreFactory"
            )),
        }
    }
}
