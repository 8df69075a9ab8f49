//! Network status probe port (driven/secondary port)
//!
//! Reports the current connectivity class. The reconciler only ever asks two
//! questions: is the network reachable at all, and is the connection exempt
//! from the "wifi-only" transfer restriction.

/// Port trait for network status checks
///
/// Both checks are synchronous and must be cheap; the reconciler calls them
/// inline on its control path.
pub trait INetworkProbe: Send + Sync {
    /// Returns true if the network is reachable at all
    fn is_online(&self) -> bool;

    /// Returns true if the current connection is unmetered (e.g. Wi-Fi)
    ///
    /// An offline probe must also return false here.
    fn is_unmetered(&self) -> bool;
}
