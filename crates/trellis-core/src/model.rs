//! LDP interaction models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::iri::Iri;

const LDP_NS: &str = "http://www.w3.org/ns/ldp#";

/// How a resource behaves under LDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InteractionModel {
    RdfSource,
    NonRdfSource,
    Container,
    BasicContainer,
    DirectContainer,
    IndirectContainer,
}

impl InteractionModel {
    /// Every known model.
    pub const ALL: [InteractionModel; 6] = [
        InteractionModel::RdfSource,
        InteractionModel::NonRdfSource,
        InteractionModel::Container,
        InteractionModel::BasicContainer,
        InteractionModel::DirectContainer,
        InteractionModel::IndirectContainer,
    ];

    /// The local name in the LDP namespace.
    pub const fn local_name(&self) -> &'static str {
        match self {
            InteractionModel::RdfSource => "RDFSource",
            InteractionModel::NonRdfSource => "NonRDFSource",
            InteractionModel::Container => "Container",
            InteractionModel::BasicContainer => "BasicContainer",
            InteractionModel::DirectContainer => "DirectContainer",
            InteractionModel::IndirectContainer => "IndirectContainer",
        }
    }

    /// The full LDP IRI.
    pub fn iri(&self) -> Iri {
        Iri::from_trusted(format!("{}{}", LDP_NS, self.local_name()))
    }

    /// Parse from a full LDP IRI.
    pub fn from_iri(iri: &str) -> Result<Self> {
        iri.strip_prefix(LDP_NS)
            .and_then(|local| {
                Self::ALL
                    .into_iter()
                    .find(|model| model.local_name() == local)
            })
            .ok_or_else(|| CoreError::InvalidArgument(format!("unknown interaction model: {}", iri)))
    }

    /// Whether binary content may be attached.
    pub const fn permits_binary(&self) -> bool {
        matches!(self, InteractionModel::NonRdfSource)
    }

    /// Whether the model is one of the container types.
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            InteractionModel::Container
                | InteractionModel::BasicContainer
                | InteractionModel::DirectContainer
                | InteractionModel::IndirectContainer
        )
    }
}

impl Default for InteractionModel {
    fn default() -> Self {
        InteractionModel::RdfSource
    }
}

impl fmt::Display for InteractionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ldp:{}", self.local_name())
    }
}
