//! Contract bindings for the data ledger, balance and access registry.

use alloy::sol;

sol! {
    /// Write-once record store keyed by measurement hash.
    #[sol(rpc)]
    interface DataLedger {
        function storeInfo(bytes32 hash, string uri, string description) external;

        function ledger(bytes32 hash) external view returns (string uri, string description);
    }
}

sol! {
    /// Per-measurement price tags. A zero price means unset.
    #[sol(rpc)]
    interface BalanceLedger {
        function setPriceToMeasurement(bytes32 hash, uint256 price) external;

        function getPriceMeasurement(bytes32 hash) external view returns (uint256);
    }
}

sol! {
    /// Registry of producer public keys and the administrator key.
    #[sol(rpc)]
    interface AccessRegistry {
        function addPubKey(string pubKey) external;

        function isPubKeyAllowed(string pubKey) external view returns (bool);

        function adminPublicKey() external view returns (string);
    }
}
