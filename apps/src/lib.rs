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

use color_eyre::eyre::{Result, eyre};
use std::path::Path;
use url::Url;

/// Converts a [`Path`] reference to an absolute path (if not already absolute)
/// and returns it as a String.
///
/// # Errors
/// If the path can't be made absolute due to not being able to get the current
/// directory, the path is empty or it isn't valid UTF-8.
pub fn path_absolute<T: ?Sized + AsRef<Path>>(path: &T) -> Result<String> {
    let absolute = std::path::absolute(path)?;
    absolute
        .to_str()
        .map(Into::into)
        .ok_or_else(|| eyre!("{} is not valid UTF-8", absolute.display()))
}

/// Interprets a command line location as a URL, treating anything that doesn't parse as
/// one as a filesystem path.
///
/// # Errors
/// If the location is a path that can't be made absolute.
pub fn location_to_url(location: &str) -> Result<Url> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(_) => Ok(Url::parse(&("file://".to_owned() + &path_absolute(location)?))?),
    }
}
