extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Ledger},
    Address, Bytes, BytesN, Env, String,
};

use crate::mock_engine::{MockEngine, MockEngineClient};
use crate::{
    ConfidentialLedger, ConfidentialLedgerClient, Error, FinalizeOutcome, ProjectStatus,
    FINALIZE_RETRY_AFTER, MIN_FUNDING_PERIOD,
};

fn setup() -> (
    Env,
    ConfidentialLedgerClient<'static>,
    MockEngineClient<'static>,
) {
    let env = Env::default();
    env.mock_all_auths();

    let engine_id = env.register(MockEngine, ());
    let ledger_id = env.register(ConfidentialLedger, ());

    let client = ConfidentialLedgerClient::new(&env, &ledger_id);
    client.init(&engine_id);

    let engine = MockEngineClient::new(&env, &engine_id);
    (env, client, engine)
}

fn enc(env: &Env, amount: u64) -> Bytes {
    Bytes::from_slice(env, &amount.to_be_bytes())
}

fn proof(env: &Env) -> Bytes {
    Bytes::from_slice(env, &[1u8; 32])
}

fn create_project(env: &Env, client: &ConfidentialLedgerClient, creator: &Address, target: u64) -> u64 {
    client.create_project(
        creator,
        &String::from_str(env, "Archive digitisation"),
        &String::from_str(env, "Scan the municipal archive"),
        &String::from_str(env, "culture"),
        &enc(env, target),
        &proof(env),
        &MIN_FUNDING_PERIOD,
        &BytesN::from_array(env, &[0x11u8; 32]),
    )
}

fn expect_pending(outcome: FinalizeOutcome) -> u64 {
    match outcome {
        FinalizeOutcome::Pending(request_id) => request_id,
        FinalizeOutcome::Finalized(status) => panic!("expected pending, got {:?}", status),
    }
}

#[test]
fn finalize_before_deadline_fails() {
    let (env, client, _engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 600), &proof(&env), &None);

    // Immediately, and one second short of the deadline.
    assert_eq!(
        client.try_request_finalize(&id),
        Err(Ok(Error::DeadlineNotReached.into()))
    );
    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline - 1);
    assert_eq!(
        client.try_request_finalize(&id),
        Err(Ok(Error::DeadlineNotReached.into()))
    );
}

#[test]
fn finalize_unknown_project_fails() {
    let (_env, client, _engine) = setup();
    assert_eq!(
        client.try_request_finalize(&7),
        Err(Ok(Error::ProjectNotFound.into()))
    );
}

#[test]
fn empty_project_finalizes_to_failed_synchronously() {
    let (env, client, _engine) = setup();
    let creator = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);

    // No contributions: nothing to decrypt, target is known positive.
    assert_eq!(
        client.request_finalize(&id),
        FinalizeOutcome::Finalized(ProjectStatus::Failed)
    );
    assert_eq!(client.get_project(&id).status, ProjectStatus::Failed);
}

#[test]
fn finalize_is_exactly_once_across_retries() {
    let (env, client, engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 700), &proof(&env), &None);

    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);

    let request_id = expect_pending(client.request_finalize(&id));

    // Retrying while the request is outstanding hands back the same id;
    // no second decryption request is issued.
    assert_eq!(
        client.request_finalize(&id),
        FinalizeOutcome::Pending(request_id)
    );

    let goal_met = engine.decrypted_result(&request_id) == 1;
    assert!(goal_met);
    assert_eq!(
        client.complete_finalize(&id, &request_id, &goal_met),
        ProjectStatus::Successful
    );

    // A duplicate callback is a no-op, not an error, and never flips the
    // status — even if it carries a contradictory result.
    assert_eq!(
        client.complete_finalize(&id, &request_id, &false),
        ProjectStatus::Successful
    );
    assert_eq!(client.get_project(&id).status, ProjectStatus::Successful);

    // Re-requesting after the fact fails loudly.
    assert_eq!(
        client.try_request_finalize(&id),
        Err(Ok(Error::AlreadyFinalized.into()))
    );
}

#[test]
fn callback_requires_engine_authorization() {
    let (env, client, engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 700), &proof(&env), &None);

    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);
    let request_id = expect_pending(client.request_finalize(&id));

    // Switch to enforced auth: a callback not authorized by the engine
    // address must not land, and the project stays Active.
    env.set_auths(&[]);
    assert!(client
        .try_complete_finalize(&id, &request_id, &true)
        .is_err());
    assert_eq!(client.get_project(&id).status, ProjectStatus::Active);

    // The genuine engine callback still completes.
    env.mock_all_auths();
    let goal_met = engine.decrypted_result(&request_id) == 1;
    assert_eq!(
        client.complete_finalize(&id, &request_id, &goal_met),
        ProjectStatus::Successful
    );
}

#[test]
fn callback_with_wrong_request_id_is_ignored() {
    let (env, client, _engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 100), &proof(&env), &None);

    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);

    let request_id = expect_pending(client.request_finalize(&id));

    // A callback quoting a different request must not finalize anything.
    assert_eq!(
        client.complete_finalize(&id, &(request_id + 1), &true),
        ProjectStatus::Active
    );
    assert_eq!(client.get_project(&id).status, ProjectStatus::Active);
}

#[test]
fn stale_request_is_superseded_and_its_callback_ignored() {
    let (env, client, engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 700), &proof(&env), &None);

    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);
    let first = expect_pending(client.request_finalize(&id));

    // The engine never answers. Once the retry window lapses, a new request
    // supersedes the old one.
    env.ledger().set_timestamp(deadline + FINALIZE_RETRY_AFTER);
    let second = expect_pending(client.request_finalize(&id));
    assert_ne!(first, second);

    // The late callback for the superseded request changes nothing.
    assert_eq!(
        client.complete_finalize(&id, &first, &false),
        ProjectStatus::Active
    );

    // The live request finalizes as usual.
    let goal_met = engine.decrypted_result(&second) == 1;
    assert_eq!(
        client.complete_finalize(&id, &second, &goal_met),
        ProjectStatus::Successful
    );
}

#[test]
fn goal_boundary_is_inclusive() {
    let (env, client, engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    // current == target counts as success.
    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 500), &proof(&env), &None);

    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);

    let request_id = expect_pending(client.request_finalize(&id));
    let goal_met = engine.decrypted_result(&request_id) == 1;
    assert_eq!(
        client.complete_finalize(&id, &request_id, &goal_met),
        ProjectStatus::Successful
    );
}

#[test]
fn below_target_finalizes_to_failed() {
    let (env, client, engine) = setup();
    let creator = Address::generate(&env);
    let alice = Address::generate(&env);

    let id = create_project(&env, &client, &creator, 500);
    client.contribute(&id, &alice, &enc(&env, 499), &proof(&env), &None);

    let deadline = client.get_project(&id).deadline;
    env.ledger().set_timestamp(deadline);

    let request_id = expect_pending(client.request_finalize(&id));
    let goal_met = engine.decrypted_result(&request_id) == 1;
    assert!(!goal_met);
    assert_eq!(
        client.complete_finalize(&id, &request_id, &goal_met),
        ProjectStatus::Failed
    );
}
