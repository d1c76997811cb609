//! Live facet data from a deployed diamond's loupe.

use alloy::{
    primitives::Address,
    providers::ProviderBuilder,
    sol,
};
use tracing::info;
use url::Url;

use crate::error::LoupeError;
use crate::replay::FacetState;

// EIP-2535 DiamondLoupe, facets() only
sol! {
    #[sol(rpc)]
    interface IDiamondLoupe {
        struct Facet {
            address facetAddress;
            bytes4[] functionSelectors;
        }

        function facets() external view returns (Facet[] memory);
    }
}

/// Asks the diamond at `diamond` which selectors each facet serves.
pub async fn fetch_facets(rpc_url: Url, diamond: Address) -> Result<FacetState, LoupeError> {
    info!("🔗 Querying facets() on {} via {}", diamond, rpc_url);
    let provider = ProviderBuilder::new().on_http(rpc_url);
    let loupe = IDiamondLoupe::new(diamond, provider);

    let mounted = loupe
        .facets()
        .call()
        .await
        .map_err(|source| LoupeError::Call { diamond, source })?
        ._0;

    let mut facets = FacetState::new();
    for facet in mounted {
        facets
            .entry(facet.facetAddress)
            .or_default()
            .extend(facet.functionSelectors);
    }
    info!("💎 Diamond reports {} facets", facets.len());
    Ok(facets)
}
