use std::sync::Arc;

use machina_core::{
    action::{builtin::Lock, Builder, Environment, Runner},
    MachinaError,
};
use machina_utils::{env::MACHINA_HOME_ENV_VAR, PathLock};
use serial_test::serial;
use tempfile::TempDir;
use tokio::sync::Notify;

use crate::support::{failing, gate, record, Log};

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_nested_locks_on_the_same_path_do_not_contend() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("nested.lock");
    let log = Log::default();

    let mut builder = Builder::new();
    builder
        .use_step(Lock::spec(path.clone()))
        .use_step(record("between", &log))
        .use_step(Lock::spec(path.clone()))
        .use_step(record("inside", &log));

    let env = Runner::new().run(builder, Environment::new()).await?;

    assert!(log.contains("inside:out"));
    assert!(env.keys().all(|key| !key.starts_with("has_lock_")));
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_concurrent_runs_contend_until_released() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("shared.lock");
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    // Hold the lock in a separate task until released
    let mut holder = Builder::new();
    holder
        .use_step(Lock::spec(path.clone()))
        .use_step(gate(entered.clone(), release.clone()));
    let handle = tokio::spawn(async move { Runner::new().run(holder, Environment::new()).await });
    entered.notified().await;

    let log = Log::default();
    let mut contender = Builder::new();
    contender
        .use_step(Lock::spec(path.clone()))
        .use_step(record("critical", &log));

    let result = Runner::new()
        .run(contender.clone(), Environment::new())
        .await;
    assert!(matches!(result, Err(MachinaError::LockContended(ref p)) if *p == path));
    assert!(!log.contains("critical:in"));

    release.notify_one();
    handle.await??;

    Runner::new().run(contender, Environment::new()).await?;
    assert!(log.contains("critical:out"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_contention_raises_the_configured_error() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("custom.lock");
    let _held = PathLock::try_acquire(&path)?;

    let builder = Builder::build(Lock::spec_with_exception(
        path.clone(),
        MachinaError::custom("machine is busy"),
    ));
    let result = Runner::new().run(builder, Environment::new()).await;

    assert!(matches!(result, Err(MachinaError::Custom(ref m)) if m == "machine is busy"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_lock_is_released_when_the_critical_section_fails() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("L");
    let log = Log::default();

    let mut builder = Builder::new();
    builder
        .use_step(Lock::spec(path.clone()))
        .use_step(failing("critical", &log));

    let result = Runner::new().run(builder, Environment::new()).await;
    assert!(matches!(result, Err(MachinaError::Custom(_))));

    let lock = PathLock::try_acquire(&path)?;
    assert_eq!(lock.path(), path.as_path());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_machine_lock_requires_a_machine() -> anyhow::Result<()> {
    let result = Runner::new()
        .run(Lock::machine(), Environment::new())
        .await;

    assert!(matches!(
        result,
        Err(MachinaError::MissingEnvironment("machine"))
    ));
    Ok(())
}

#[test_log::test(tokio::test)]
#[serial]
async fn test_named_lock_lives_in_machina_home() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    std::env::set_var(MACHINA_HOME_ENV_VAR, temp.path());

    let log = Log::default();
    let mut builder = Builder::new();
    builder
        .use_step(Lock::named("boxes"))
        .use_step(Lock::named("boxes"))
        .use_step(record("inside", &log));

    let result = Runner::new().run(builder, Environment::new()).await;
    std::env::remove_var(MACHINA_HOME_ENV_VAR);
    result?;

    assert!(log.contains("inside:out"));
    assert!(temp.path().join("locks").join("boxes.lock").exists());
    Ok(())
}
