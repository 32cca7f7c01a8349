//! Fixed network configuration tables for payment settlement.
//!
//! Maps marketplace network names to CAIP-2 chain identifiers and to the
//! settlement asset's on-chain address. Unknown network names silently fall
//! back to the default network's entries.

pub const DEFAULT_NETWORK: &str = "celo";

/// CAIP-2 chain identifier for a network name.
pub fn caip2(network: &str) -> &'static str {
    match network {
        "celo" => "eip155:42220",
        "celo-sepolia" => "eip155:44787",
        "base" => "eip155:8453",
        "avalanche" => "eip155:43114",
        _ => "eip155:42220",
    }
}

/// On-chain address of the settlement stablecoin on a network.
pub fn asset_address(network: &str) -> &'static str {
    match network {
        "celo" => "0xcebA9300f2b948710d2653dD7B07f33A8B32118C",
        "celo-sepolia" => "0x2F25deB3848C207fc8E0c34035B3Ba7fC157602B",
        "base" => "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        "avalanche" => "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E",
        _ => "0xcebA9300f2b948710d2653dD7B07f33A8B32118C",
    }
}

/// Display name of the settlement asset on a network.
pub fn asset_name(network: &str) -> &'static str {
    match network {
        "base" | "avalanche" => "USD Coin",
        _ => "USDT",
    }
}
