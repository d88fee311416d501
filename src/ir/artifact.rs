use super::Graph;
use crate::error::ArtifactError;
use crate::platform::Platform;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A converted graph packaged for a generator running elsewhere.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphArtifact {
    /// The platform the graph was read from.
    pub source: Platform,
    pub graph: Graph,
}

impl GraphArtifact {
    pub fn new(source: Platform, graph: Graph) -> Self {
        Self { source, graph }
    }

    /// Encodes the artifact with bincode's standard configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard())
            .map_err(|e| ArtifactError::Encode(format!("Serialization failed: {}", e)))
    }

    /// Saves the artifact to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path)
            .map_err(|e| ArtifactError::Io(format!("Could not create file '{}': {}", path, e)))?;
        file.write_all(&bytes)
            .map_err(|e| ArtifactError::Io(format!("Could not write to file '{}': {}", path, e)))?;
        Ok(())
    }

    /// Loads an artifact previously written by [`GraphArtifact::save`].
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path)
            .map_err(|e| ArtifactError::Io(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            ArtifactError::Io(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decodes an artifact from bytes produced by [`GraphArtifact::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(artifact, _)| artifact)
            .map_err(|e| ArtifactError::Decode(format!("Deserialization failed: {}", e)))
    }
}
