use crate::stack::{
    CreatedStack, StackClient, StackClientError, StackClientResult, StackDescriptor, StackFiles,
    StackLink, StackOutput, StackParameters, StackStatus,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::time::Instant;

/// Calls received by a [`ScriptedStackClient`], in order
#[derive(Debug, Clone, PartialEq)]
pub enum StackCall {
    Create {
        name: String,
        parameters: StackParameters,
        files: Vec<String>,
    },
    Update {
        stack_id: String,
        name: String,
        parameters: StackParameters,
    },
    Get {
        id_or_name: String,
    },
    Delete {
        stack_id: String,
    },
    NetworkParameters,
}

type Hook = Box<dyn Fn() + Send + Sync>;

struct ScriptState {
    create_result: StackClientResult<CreatedStack>,
    update_result: StackClientResult<()>,
    delete_result: StackClientResult<()>,
    get_script: VecDeque<StackClientResult<StackDescriptor>>,
    get_fallback: StackClientResult<StackDescriptor>,
    network: StackParameters,
    calls: Vec<StackCall>,
    get_instants: Vec<Instant>,
}

/// Stack client whose responses are scripted up front.
///
/// `get` answers from a queue, then repeats the fallback (in progress unless changed)
/// once the queue is drained.
pub struct ScriptedStackClient {
    state: Mutex<ScriptState>,
    on_network_parameters: Mutex<Option<Hook>>,
}

impl Default for ScriptedStackClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedStackClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                create_result: Ok(created_stack("s1")),
                update_result: Ok(()),
                delete_result: Ok(()),
                get_script: VecDeque::new(),
                get_fallback: Ok(descriptor("s1", StackStatus::InProgress, &[])),
                network: StackParameters::new(),
                calls: Vec::new(),
                get_instants: Vec::new(),
            }),
            on_network_parameters: Mutex::new(None),
        }
    }

    pub fn set_create_result(&self, result: StackClientResult<CreatedStack>) {
        self.state.lock().create_result = result;
    }

    pub fn set_update_result(&self, result: StackClientResult<()>) {
        self.state.lock().update_result = result;
    }

    pub fn set_delete_result(&self, result: StackClientResult<()>) {
        self.state.lock().delete_result = result;
    }

    pub fn set_network_parameters(&self, network: StackParameters) {
        self.state.lock().network = network;
    }

    /// Queue the answer to the next unanswered `get`
    pub fn push_get(&self, result: StackClientResult<StackDescriptor>) {
        self.state.lock().get_script.push_back(result);
    }

    /// Answer for every `get` once the queue is empty
    pub fn set_get_fallback(&self, result: StackClientResult<StackDescriptor>) {
        self.state.lock().get_fallback = result;
    }

    /// Report IN_PROGRESS for `attempt - 1` polls, then COMPLETE with `endpoint`
    pub fn complete_on_attempt(&self, stack_id: &str, attempt: u32, endpoint: &str) {
        for _ in 1..attempt {
            self.push_get(Ok(descriptor(stack_id, StackStatus::InProgress, &[])));
        }
        self.push_get(Ok(descriptor(stack_id, StackStatus::Complete, &[endpoint])));
    }

    /// Run `hook` whenever network parameters are requested
    pub fn on_network_parameters(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_network_parameters.lock() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<StackCall> {
        self.state.lock().calls.clone()
    }

    /// Virtual-clock instants at which each `get` arrived
    pub fn get_instants(&self) -> Vec<Instant> {
        self.state.lock().get_instants.clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, StackCall::Create { .. }))
    }

    pub fn update_count(&self) -> usize {
        self.count(|c| matches!(c, StackCall::Update { .. }))
    }

    pub fn get_count(&self) -> usize {
        self.count(|c| matches!(c, StackCall::Get { .. }))
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, StackCall::Delete { .. }))
    }

    fn count(&self, predicate: impl Fn(&StackCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

impl std::fmt::Debug for ScriptedStackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedStackClient")
            .field("calls", &self.state.lock().calls.len())
            .finish()
    }
}

#[async_trait]
impl StackClient for ScriptedStackClient {
    async fn create(
        &self,
        name: &str,
        _template: &str,
        parameters: &StackParameters,
        files: &StackFiles,
    ) -> StackClientResult<CreatedStack> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::Create {
            name: name.to_string(),
            parameters: parameters.clone(),
            files: files.keys().cloned().collect(),
        });
        state.create_result.clone()
    }

    async fn update(
        &self,
        stack_id: &str,
        name: &str,
        _template: &str,
        parameters: &StackParameters,
    ) -> StackClientResult<()> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::Update {
            stack_id: stack_id.to_string(),
            name: name.to_string(),
            parameters: parameters.clone(),
        });
        state.update_result.clone()
    }

    async fn get(&self, id_or_name: &str) -> StackClientResult<StackDescriptor> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::Get {
            id_or_name: id_or_name.to_string(),
        });
        state.get_instants.push(Instant::now());
        match state.get_script.pop_front() {
            Some(result) => result,
            None => state.get_fallback.clone(),
        }
    }

    async fn delete(&self, stack_id: &str) -> StackClientResult<()> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::Delete {
            stack_id: stack_id.to_string(),
        });
        state.delete_result.clone()
    }

    async fn network_parameters(&self) -> StackClientResult<StackParameters> {
        if let Some(hook) = self.on_network_parameters.lock().as_ref() {
            hook();
        }
        let mut state = self.state.lock();
        state.calls.push(StackCall::NetworkParameters);
        Ok(state.network.clone())
    }
}

/// Stack create acknowledgement with one self link
pub fn created_stack(stack_id: &str) -> CreatedStack {
    CreatedStack {
        id: stack_id.to_string(),
        links: vec![StackLink {
            href: format!("http://stacks.local/v1/stacks/{stack_id}"),
            rel: "self".to_string(),
        }],
    }
}

/// Descriptor with one output per endpoint
pub fn descriptor(stack_id: &str, status: StackStatus, endpoints: &[&str]) -> StackDescriptor {
    StackDescriptor {
        id: stack_id.to_string(),
        name: format!("stack-{stack_id}"),
        status,
        outputs: endpoints
            .iter()
            .map(|endpoint| StackOutput {
                output_key: "URL".to_string(),
                output_value: endpoint.to_string(),
            })
            .collect(),
    }
}

pub fn not_found(stack: &str) -> StackClientResult<StackDescriptor> {
    Err(StackClientError::not_found(stack))
}
