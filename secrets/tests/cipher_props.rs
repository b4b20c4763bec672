use std::sync::Arc;

use dailyread_nullables::{NullClock, NullConfigStore};
use dailyread_secrets::{CredentialCipher, SecretStore};
use proptest::prelude::*;

fn cipher() -> CredentialCipher {
    CredentialCipher::new(SecretStore::new(
        Arc::new(NullConfigStore::new()),
        Arc::new(NullClock::new(0)),
    ))
}

proptest! {
    #[test]
    fn decrypt_inverts_encrypt(plaintext in ".{1,64}") {
        let cipher = cipher();
        let sealed = cipher.encrypt(&plaintext).unwrap();
        prop_assert_ne!(&sealed, &plaintext);
        prop_assert_eq!(cipher.decrypt(&sealed).unwrap(), plaintext);
    }
}
