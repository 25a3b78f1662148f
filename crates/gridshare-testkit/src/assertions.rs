//! Rejection assertions

/// Assert that a ledger call was rejected with the given host error code.
///
/// ```rust
/// use gridshare_testkit::{assert_rejected, empty_ledger, principal};
///
/// let ledger = empty_ledger();
/// assert_rejected!(ledger.consumer_info(&principal(9)), 101);
/// ```
#[macro_export]
macro_rules! assert_rejected {
    ($result:expr, $code:expr) => {
        match $result {
            Ok(value) => panic!(
                "expected rejection with code {}, got Ok({:?})",
                $code, value
            ),
            Err(err) => assert_eq!(
                err.code(),
                $code,
                "expected code {}, got {} ({})",
                $code,
                err.code(),
                err
            ),
        }
    };
}

/// Assert that `$body` leaves the ledger's state digest and sequence unchanged.
#[macro_export]
macro_rules! assert_state_unchanged {
    ($ledger:expr, $body:block) => {{
        let digest_before = $ledger.state_digest().expect("digest before");
        let sequence_before = $ledger.sequence();
        let result = $body;
        assert_eq!(
            $ledger.state_digest().expect("digest after"),
            digest_before,
            "ledger state changed"
        );
        assert_eq!($ledger.sequence(), sequence_before, "sequence advanced");
        result
    }};
}
