use std::{
    sync::{mpsc, Arc, Mutex},
    time::Duration,
};

use machina_core::{
    action::{
        builtin::{
            CheckCreated, CheckRunning, CleanupPlace, Confirm, Create, EnvSet, HandleBox,
            IsEnvSet, IsState, Message, ProvisionerCleanup, SetHostname,
        },
        keys, Builder, Environment, Runner,
    },
    config::{MachineConfig, ProvisionerEntry},
    machine::MachineState,
    ui::{Ui, UiLevel},
    MachinaError, MachinaResult,
};
use serde_json::json;

use crate::support::{failing, record, Log, MachineOptions, RecordingUi, TestMachine};

//--------------------------------------------------------------------------------------------------
// Tests: Predicates
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_is_state_and_its_inverse() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::Saved, MachineConfig::default())?;

    let env = Runner::new()
        .run(IsState::spec(MachineState::Saved), machine.env())
        .await?;
    assert_eq!(env.result, Some(true));

    let env = Runner::new()
        .run(IsState::spec_not(MachineState::Saved), machine.env())
        .await?;
    assert_eq!(env.result, Some(false));

    let env = Runner::new()
        .run(IsState::spec(MachineState::Running), machine.env())
        .await?;
    assert_eq!(env.result, Some(false));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_is_env_set() -> anyhow::Result<()> {
    let env = Runner::new()
        .run(IsEnvSet::spec("key"), Environment::new().with("key", "value"))
        .await?;
    assert_eq!(env.result, Some(true));

    let env = Runner::new()
        .run(IsEnvSet::spec("key"), Environment::new().with("key", false))
        .await?;
    assert_eq!(env.result, Some(false));

    let env = Runner::new()
        .run(IsEnvSet::spec_not("key"), Environment::new())
        .await?;
    assert_eq!(env.result, Some(true));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_state_guards() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, MachineConfig::default())?;
    let result = Runner::new().run(CheckCreated::spec(), machine.env()).await;
    assert!(matches!(result, Err(MachinaError::MachineNotCreated(ref name)) if name == "default"));

    machine.provider.set_state(MachineState::PowerOff);
    Runner::new().run(CheckCreated::spec(), machine.env()).await?;

    let result = Runner::new().run(CheckRunning::spec(), machine.env()).await;
    assert!(matches!(result, Err(MachinaError::MachineNotRunning(_))));

    machine.provider.set_state(MachineState::Running);
    Runner::new().run(CheckRunning::spec(), machine.env()).await?;
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests: Confirm and Message
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_confirm_accepts_yes_case_insensitively() -> anyhow::Result<()> {
    let ui = Arc::new(RecordingUi::with_answers(&[" y "]));
    let env = Runner::new()
        .run(
            Confirm::spec("continue?", Some("force_it"), None),
            Environment::new().with_ui(ui),
        )
        .await?;

    assert_eq!(env.result, Some(true));
    assert_eq!(env.get("force_it_result"), Some(&json!(true)));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_confirm_any_other_answer_is_no() -> anyhow::Result<()> {
    let ui = Arc::new(RecordingUi::with_answers(&["nope"]));
    let env = Runner::new()
        .run(
            Confirm::spec("continue?", None, None),
            Environment::new().with_ui(ui),
        )
        .await?;

    assert_eq!(env.result, Some(false));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_confirm_repeats_until_an_allowed_answer() -> anyhow::Result<()> {
    let ui = Arc::new(RecordingUi::with_answers(&["maybe", "later", "N"]));
    let allowed = vec!["Y".to_string(), "N".to_string()];

    let env = Runner::new()
        .run(
            Confirm::spec("continue?", None, Some(allowed)),
            Environment::new().with_ui(ui.clone()),
        )
        .await?;

    assert_eq!(env.result, Some(false));
    assert_eq!(ui.answers_left(), 0);
    Ok(())
}

/// Waits for the answer to arrive from another task.
struct ChannelUi {
    answers: Mutex<mpsc::Receiver<String>>,
}

impl Ui for ChannelUi {
    fn say(&self, _level: UiLevel, _message: &str) {}

    fn ask(&self, _prompt: &str) -> MachinaResult<String> {
        let answers = self.answers.lock().unwrap();
        answers.recv().map_err(|_| MachinaError::NonInteractive)
    }
}

#[test_log::test(tokio::test)]
async fn test_confirm_prompt_does_not_block_the_runtime() -> anyhow::Result<()> {
    let (sender, receiver) = mpsc::channel();
    let ui = Arc::new(ChannelUi {
        answers: Mutex::new(receiver),
    });

    let answer = async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        sender.send("y".to_string()).unwrap();
    };
    let runner = Runner::new();
    let confirm = runner.run(
        Confirm::spec("continue?", None, None),
        Environment::new().with_ui(ui),
    );

    let (env, ()) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(confirm, answer)
    })
    .await?;

    assert_eq!(env?.result, Some(true));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_confirm_force_key_skips_the_question() -> anyhow::Result<()> {
    let env = Runner::new()
        .run(
            Confirm::spec("destroy?", Some(keys::FORCE_CONFIRM_DESTROY), None),
            Environment::new().with(keys::FORCE_CONFIRM_DESTROY, true),
        )
        .await?;

    assert_eq!(env.result, Some(true));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_confirm_without_interactive_ui_fails() -> anyhow::Result<()> {
    let result = Runner::new()
        .run(Confirm::spec("continue?", None, None), Environment::new())
        .await;

    assert!(matches!(result, Err(MachinaError::NonInteractive)));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_message_uses_the_given_level() -> anyhow::Result<()> {
    let ui = Arc::new(RecordingUi::new());
    let mut builder = Builder::new();
    builder
        .use_step(Message::spec("hello"))
        .use_step(Message::spec_with_level(UiLevel::Warn, "careful"))
        .use_step(EnvSet::spec([("done", true)]));

    let env = Runner::new()
        .run(builder, Environment::new().with_ui(ui.clone()))
        .await?;

    assert!(ui.said_at(UiLevel::Info, "hello"));
    assert!(ui.said_at(UiLevel::Warn, "careful"));
    assert!(env.is_truthy("done"));
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests: Machine Steps
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_create_is_undone_when_a_later_step_fails() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, MachineConfig::default())?;
    let log = Log::default();

    let mut builder = Builder::new();
    builder
        .use_step(Create::spec())
        .use_step(failing("later", &log));

    let result = Runner::new().run(builder, machine.env()).await;

    assert!(result.is_err());
    assert_eq!(
        machine.log.entries(),
        ["provider:create", "provider:destroy"]
    );
    assert_eq!(machine.machine.id(), None);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_create_is_kept_after_an_interrupt() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, MachineConfig::default())?;
    let log = Log::default();

    let mut builder = Builder::new();
    builder
        .use_step(Create::spec())
        .use_step(machina_core::action::StepSpec::from_fn("interrupt", |env| {
            env.interrupt_flag().set();
            Ok(())
        }))
        .use_step(record("never", &log));

    let result = Runner::new().run(builder, machine.env()).await;

    assert!(matches!(result, Err(MachinaError::Interrupted)));
    assert_eq!(machine.log.entries(), ["provider:create"]);
    assert_eq!(machine.machine.id().as_deref(), Some("machine-id"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_set_hostname_after_the_chain() -> anyhow::Result<()> {
    let config = MachineConfig::builder().hostname("web-1").build();
    let machine = TestMachine::new(MachineState::Running, config)?;
    let log = machine.log.clone();

    let mut builder = Builder::new();
    builder
        .use_step(SetHostname::spec())
        .use_step(machina_core::action::StepSpec::from_fn("boot", move |_env| {
            log.push("boot");
            Ok(())
        }));

    Runner::new().run(builder, machine.env()).await?;

    assert_eq!(machine.log.entries(), ["boot", "guest:change_host_name:web-1"]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_set_hostname_without_capability_warns() -> anyhow::Result<()> {
    let config = MachineConfig::builder().hostname("web-1").build();
    let machine = TestMachine::with_options(
        MachineOptions {
            state: MachineState::Running,
            capabilities: Vec::new(),
            ..Default::default()
        },
        config,
    )?;

    Runner::new().run(SetHostname::spec(), machine.env()).await?;

    assert!(machine.ui.said_at(UiLevel::Warn, "web-1"));
    assert!(machine.log.entries().is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_handle_box_adds_missing_box() -> anyhow::Result<()> {
    let config = MachineConfig::builder()
        .provider("fake")
        .box_name("base/linux")
        .build();
    let machine = TestMachine::new(MachineState::NotCreated, config)?;

    Runner::new().run(HandleBox::spec(), machine.env()).await?;
    Runner::new().run(HandleBox::spec(), machine.env()).await?;

    assert_eq!(machine.log.entries(), ["boxes:add:base/linux:catalog"]);
    assert!(machine.ui.said("base/linux"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_handle_box_prefers_the_configured_url() -> anyhow::Result<()> {
    let config = MachineConfig::builder()
        .provider("fake")
        .box_name("custom")
        .box_url("https://boxes.example.com/custom.box")
        .build();
    let machine = TestMachine::new(MachineState::NotCreated, config)?;

    Runner::new().run(HandleBox::spec(), machine.env()).await?;

    assert_eq!(
        machine.log.entries(),
        ["boxes:add:custom:https://boxes.example.com/custom.box"]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_handle_box_tolerates_concurrent_add() -> anyhow::Result<()> {
    let config = MachineConfig::builder()
        .provider("fake")
        .box_name("raced")
        .build();
    let machine = TestMachine::with_options(
        MachineOptions {
            box_added_elsewhere: true,
            ..Default::default()
        },
        config,
    )?;

    let log = Log::default();
    let mut builder = Builder::new();
    builder
        .use_step(HandleBox::spec())
        .use_step(record("after", &log));

    Runner::new().run(builder, machine.env()).await?;

    assert!(log.contains("after:out"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_handle_box_skips_present_and_unconfigured_boxes() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, MachineConfig::default())?;
    Runner::new().run(HandleBox::spec(), machine.env()).await?;

    let config = MachineConfig::builder()
        .provider("fake")
        .box_name("present")
        .build();
    let machine = TestMachine::new(MachineState::NotCreated, config)?;
    machine.boxes.with_box("present", "fake");
    Runner::new().run(HandleBox::spec(), machine.env()).await?;

    assert!(machine.log.entries().is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provisioner_cleanup_before_and_after() -> anyhow::Result<()> {
    let config = MachineConfig::builder()
        .provisioners(vec![
            ProvisionerEntry::builder().name("one").kind("shell").build(),
            ProvisionerEntry::builder()
                .name("each")
                .kind("shell")
                .before(":each")
                .build(),
            ProvisionerEntry::builder().name("two").kind("shell").build(),
        ])
        .build();
    let machine = TestMachine::new(MachineState::Running, config)?;
    let log = machine.log.clone();

    let mut builder = Builder::new();
    builder
        .use_step(ProvisionerCleanup::spec(CleanupPlace::After))
        .use_step(machina_core::action::StepSpec::from_fn("work", move |_env| {
            log.push("work");
            Ok(())
        }));

    Runner::new().run(builder, machine.env()).await?;

    assert_eq!(
        machine.log.entries(),
        ["work", "cleanup:each", "cleanup:one", "cleanup:two"]
    );
    assert!(machine.ui.said("running cleanup tasks for provisioner: one (shell)"));
    Ok(())
}
