// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce an asset from a file.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The OBJ parser rejected the file.
    #[error("failed to parse OBJ '{path}': {source}")]
    Obj {
        /// The model file.
        path: PathBuf,
        /// The parser error.
        source: tobj::LoadError,
    },
    /// An image could not be decoded.
    #[error("failed to decode image '{path}': {source}")]
    Image {
        /// The image file.
        path: PathBuf,
        /// The decoder error.
        source: image::ImageError,
    },
    /// The material library of a model could not be loaded.
    #[error("materials of '{path}' could not be loaded: {reason}")]
    MissingMaterial {
        /// The model file.
        path: PathBuf,
        /// Why the material library failed.
        reason: String,
    },
    /// The file extension does not name a supported format.
    #[error("unsupported asset format '{extension}' for '{path}'")]
    UnsupportedFormat {
        /// The offending file.
        path: PathBuf,
        /// Its extension, possibly empty.
        extension: String,
    },
    /// The file parsed but contained no mesh.
    #[error("'{path}' contains no meshes")]
    Empty {
        /// The model file.
        path: PathBuf,
    },
}
