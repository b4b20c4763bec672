use std::sync::Arc;

use dailyread_nullables::{NullClock, NullSession};
use dailyread_verification::{
    ChallengeConfig, ChallengeError, ChallengeGate, ChallengeSession, PendingChallenge,
};
use dailyread_types::Timestamp;

fn gate() -> (Arc<NullClock>, ChallengeGate) {
    let clock = Arc::new(NullClock::new(1_000));
    let gate = ChallengeGate::new(clock.clone(), ChallengeConfig::default());
    (clock, gate)
}

fn pending_code(session: &NullSession) -> String {
    session.pending_challenge().unwrap().code.clone()
}

#[test]
fn wrong_guesses_keep_the_challenge_until_a_correct_one() {
    let (clock, gate) = gate();
    let mut session = NullSession::new();
    gate.issue(&mut session).unwrap();
    let code = pending_code(&session);

    for _ in 0..3 {
        clock.advance(10);
        assert_eq!(gate.validate(&mut session, "!!!!"), Err(ChallengeError::Mismatch));
        assert!(session.pending_challenge().is_some());
    }

    assert_eq!(gate.validate(&mut session, &code.to_lowercase()), Ok(()));
    assert!(session.pending_challenge().is_none());
    assert_eq!(gate.validate(&mut session, &code), Err(ChallengeError::Missing));
}

#[test]
fn expiry_clears_the_challenge() {
    let (clock, gate) = gate();
    let mut session = NullSession::new();
    gate.issue(&mut session).unwrap();
    let code = pending_code(&session);

    clock.advance(301);
    assert_eq!(gate.validate(&mut session, &code), Err(ChallengeError::Expired));
    assert!(session.pending_challenge().is_none());
}

#[test]
fn issued_image_is_png() {
    let (_clock, gate) = gate();
    let mut session = NullSession::new();
    let issued = gate.issue(&mut session).unwrap();
    assert_eq!(&issued.png[1..4], b"PNG");
    assert_eq!(issued.expires_in, 300);
}

#[test]
fn answer_is_case_insensitive() {
    let (_clock, gate) = gate();
    let mut session = NullSession::new();
    session.store_challenge(PendingChallenge {
        code: "K7QZ".into(),
        issued_at: Timestamp::new(1_000),
    });
    assert_eq!(gate.validate(&mut session, " k7qz "), Ok(()));
}
