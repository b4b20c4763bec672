use proptest::prelude::*;

use dailyread_types::{PollingAlgorithm, Timestamp, VerificationCode, VerificationKind};

fn kind_strategy() -> impl Strategy<Value = VerificationKind> {
    prop::sample::select(VerificationKind::ALL.to_vec())
}

proptest! {
    /// A code is live exactly when it is unused and `now` is before expiry.
    #[test]
    fn code_liveness_matches_definition(
        created in 0u64..1_000_000,
        ttl in 0u64..100_000,
        offset in 0u64..200_000,
        used in any::<bool>(),
        kind in kind_strategy(),
    ) {
        let code = VerificationCode {
            id: 7,
            subject: "s".into(),
            code: "000000".into(),
            kind,
            expires_at: Timestamp::new(created + ttl),
            used,
            created_at: Timestamp::new(created),
        };
        let now = Timestamp::new(created + offset);
        prop_assert_eq!(code.is_live(now), !used && offset < ttl);
        prop_assert_eq!(code.is_reclaimable(now), !code.is_live(now));
    }

    /// VerificationCode survives a bincode round trip (the LMDB record format).
    #[test]
    fn code_bincode_roundtrip(
        subject in "[a-z0-9@.]{1,40}",
        digits in "[0-9]{6}",
        kind in kind_strategy(),
        created in any::<u32>(),
    ) {
        let code = VerificationCode {
            id: created as u64,
            subject,
            code: digits,
            kind,
            expires_at: Timestamp::new(created as u64 + 600),
            used: false,
            created_at: Timestamp::new(created as u64),
        };
        let bytes = bincode::serialize(&code).unwrap();
        let decoded: VerificationCode = bincode::deserialize(&bytes).unwrap();
        prop_assert_eq!(decoded, code);
    }

    /// Timestamp ordering matches the underlying seconds.
    #[test]
    fn timestamp_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Timestamp::new(a) < Timestamp::new(b), a < b);
    }
}

#[test]
fn algorithm_strings_round_trip() {
    for alg in [PollingAlgorithm::Sequential, PollingAlgorithm::Random] {
        assert_eq!(alg.to_string().parse::<PollingAlgorithm>().unwrap(), alg);
    }
}
