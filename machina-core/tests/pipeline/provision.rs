use machina_core::{
    action::{builtin::Provision, keys, Builder, HookRegistry, Runner, StepSpec},
    config::{MachineConfig, ProvisionerEntry, RunMode, PROVISIONER_RUN_HOOK},
    machine::MachineState,
    provision::sentinel,
    MachinaError,
};
use serde_json::json;

use crate::support::{Log, TestMachine};

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn shell(name: &str, run: RunMode) -> ProvisionerEntry {
    ProvisionerEntry::builder()
        .name(name)
        .kind("shell")
        .run(run)
        .build()
}

fn machine_with(entries: Vec<ProvisionerEntry>) -> anyhow::Result<TestMachine> {
    let config = MachineConfig::builder().provisioners(entries).build();
    TestMachine::new(MachineState::Running, config)
}

fn write_sentinel(machine: &TestMachine, contents: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(machine.data_dir())?;
    std::fs::write(machine.machine.sentinel_path(), contents)?;
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_first_provision_runs_and_writes_sentinel() -> anyhow::Result<()> {
    let machine = machine_with(vec![shell("spec-test", RunMode::Once)])?;

    Runner::new()
        .run(Provision::spec(), machine.env().with(keys::PROVISION_IGNORE_SENTINEL, false))
        .await?;

    assert!(machine.log.contains("provision:spec-test"));
    assert_eq!(
        std::fs::read_to_string(machine.machine.sentinel_path())?,
        "1.5:machine-id"
    );
    assert!(machine.ui.said("running provisioner: spec-test (shell)"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provisioned_machine_only_runs_always_provisioners() -> anyhow::Result<()> {
    let machine = machine_with(vec![
        shell("once", RunMode::Once),
        shell("always", RunMode::Always),
    ])?;
    write_sentinel(&machine, "1.5:machine-id")?;

    let env = Runner::new()
        .run(Provision::spec(), machine.env().with(keys::PROVISION_IGNORE_SENTINEL, false))
        .await?;

    assert!(!machine.log.contains("provision:once"));
    assert!(machine.log.contains("provision:always"));
    assert_eq!(env.get(keys::PROVISION_ENABLED), Some(&json!(false)));
    assert!(machine.ui.said("already provisioned"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_sentinel_is_ignored_by_default() -> anyhow::Result<()> {
    let machine = machine_with(vec![shell("once", RunMode::Once)])?;
    write_sentinel(&machine, "1.5:machine-id")?;

    Runner::new().run(Provision::spec(), machine.env()).await?;

    assert!(machine.log.contains("provision:once"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_legacy_sentinel_provisions_again_and_is_upgraded() -> anyhow::Result<()> {
    let machine = machine_with(vec![shell("once", RunMode::Once)])?;
    write_sentinel(&machine, "machine-id")?;

    let env = Runner::new()
        .run(Provision::spec(), machine.env().with(keys::PROVISION_IGNORE_SENTINEL, false))
        .await?;

    assert!(machine.log.contains("provision:once"));
    assert_eq!(env.get(keys::PROVISION_ENABLED), Some(&json!(true)));
    assert!(!machine.ui.said("already provisioned"));
    assert_eq!(
        std::fs::read_to_string(machine.machine.sentinel_path())?,
        "1.5:machine-id"
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_foreign_sentinel_is_replaced() -> anyhow::Result<()> {
    let machine = machine_with(vec![shell("once", RunMode::Once)])?;
    write_sentinel(&machine, "1.5:another-machine")?;

    Runner::new()
        .run(Provision::spec(), machine.env().with(keys::PROVISION_IGNORE_SENTINEL, false))
        .await?;

    assert!(machine.log.contains("provision:once"));
    assert_eq!(
        sentinel::read(&machine.machine.sentinel_path(), Some("machine-id")).await?,
        sentinel::SentinelState::Current
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_disabled_provisioning_runs_nothing() -> anyhow::Result<()> {
    let machine = machine_with(vec![
        shell("once", RunMode::Once),
        shell("always", RunMode::Always),
    ])?;

    Runner::new()
        .run(Provision::spec(), machine.env().with(keys::PROVISION_ENABLED, false))
        .await?;

    assert!(!machine.log.contains("provision:once"));
    assert!(!machine.log.contains("provision:always"));
    assert!(machine.ui.said("provisioning is disabled"));
    assert!(!machine.machine.sentinel_path().exists());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_types_select_by_name_or_type() -> anyhow::Result<()> {
    let machine = machine_with(vec![
        shell("first", RunMode::Once),
        shell("second", RunMode::Always),
        shell("hidden", RunMode::Never),
    ])?;

    Runner::new()
        .run(
            Provision::spec(),
            machine.env().with(keys::PROVISION_TYPES, json!(["hidden"])),
        )
        .await?;
    assert_eq!(machine.log.entries(), ["provision:hidden"]);

    Runner::new()
        .run(
            Provision::spec(),
            machine.env().with(keys::PROVISION_TYPES, json!(["shell"])),
        )
        .await?;
    assert_eq!(
        machine.log.entries(),
        ["provision:hidden", "provision:first", "provision:second"]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provisioners_run_in_dependency_order() -> anyhow::Result<()> {
    let machine = machine_with(vec![
        shell("main", RunMode::Once),
        ProvisionerEntry::builder()
            .name("setup")
            .kind("shell")
            .before("main")
            .build(),
        ProvisionerEntry::builder()
            .name("report")
            .kind("shell")
            .after(":each")
            .build(),
    ])?;

    Runner::new().run(Provision::spec(), machine.env()).await?;

    assert_eq!(
        machine.log.entries(),
        [
            "provision:setup",
            "provision:report",
            "provision:main",
            "provision:report"
        ]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_unknown_ordering_reference_fails_before_provisioning() -> anyhow::Result<()> {
    let machine = machine_with(vec![ProvisionerEntry::builder()
        .name("setup")
        .kind("shell")
        .before("missing")
        .build()])?;

    let result = Runner::new().run(Provision::spec(), machine.env()).await;

    assert!(matches!(
        result,
        Err(MachinaError::UnknownProvisionerReference { .. })
    ));
    assert!(machine.log.entries().is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_each_provisioner_run_goes_through_the_hook() -> anyhow::Result<()> {
    let machine = machine_with(vec![
        shell("first", RunMode::Once),
        ProvisionerEntry::builder()
            .name("second")
            .kind("shell")
            .run(RunMode::Always)
            .build(),
    ])?;

    let seen = Log::default();
    let hook_seen = seen.clone();
    let mut hooks = HookRegistry::new();
    hooks.register(PROVISIONER_RUN_HOOK, move |hook| {
        let seen = hook_seen.clone();
        hook.prepend(StepSpec::from_fn("announce", move |env| {
            let name = env
                .get(keys::PROVISIONER_NAME)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            seen.push(format!("announce:{}", name));
            Ok(())
        }));
    });

    let runner = Runner::new().with_hooks(hooks);
    let env = runner.run(Provision::spec(), machine.env()).await?;

    assert_eq!(seen.entries(), ["announce:shell", "announce:shell"]);
    assert_eq!(machine.log.entries(), ["provision:first", "provision:second"]);
    assert!(env.get(keys::PROVISIONER_NAME).is_none());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_runs_after_the_rest_of_the_chain() -> anyhow::Result<()> {
    let machine = machine_with(vec![shell("main", RunMode::Always)])?;
    let log = machine.log.clone();

    let mut builder = Builder::new();
    builder
        .use_step(Provision::spec())
        .use_step(StepSpec::from_fn("boot", move |_env| {
            log.push("boot");
            Ok(())
        }));

    Runner::new().run(builder, machine.env()).await?;

    assert_eq!(machine.log.entries(), ["boot", "provision:main"]);
    Ok(())
}
