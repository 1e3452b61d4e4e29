//! The Guard mediator (C7, spec.md §4.6), grounded on
//! `original_source/src/guard/agent.py`'s `Guard` class: the single
//! orchestrator wiring the predicate store, vector index, conversation
//! context, threat tracking, verdict cache, and the oracle-backed
//! watcher/judge agents into the two public checks `handle_message` and
//! `handle_action`.

use caliber_agents::{Judge, Observation, PredicateWatcher, ThreatWatcher, ToolDescriptor};
use caliber_context::{ConversationContext, PredicateIndex, SenderHistory};
use caliber_core::{AgentLabel, GuardConfig, GuardError, GuardResult, OracleError, PredicateName, ThreatLevel, ToolName};
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::embedding::EmbeddingFunction;
use caliber_llm::oracle::Oracle;
use caliber_policy::{verify, Fingerprint, PolicyKind, Predicate, PolicySet, PredicateStore, VerdictCache};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The CALIBER guard: the mediator that every interception adapter call
/// ultimately routes through (C7, spec.md §4.6).
pub struct Guard {
    config: GuardConfig,
    enabled: bool,
    pub force_message_check: bool,

    store: PredicateStore,
    index: PredicateIndex,
    context: ConversationContext,
    sender_histories: HashMap<AgentLabel, SenderHistory>,
    threat_levels: HashMap<AgentLabel, ThreatLevel>,
    tool_registry: HashMap<ToolName, String>,
    verdict_cache: VerdictCache,

    predicate_watcher: PredicateWatcher,
    threat_watcher: ThreatWatcher,
    judge: Judge,
    chief_judge: Judge,
    embedder: Arc<dyn EmbeddingFunction>,
    ingestion: caliber_ingestion::PolicyIngestion,
}

impl Guard {
    /// Construct a guard. The three oracle roles spec.md §4.6's
    /// `[ADD]` note describes (primary model, chief-judge model, a
    /// possibly-distinct policy-extraction model) are passed
    /// separately, matching `Guard.__init__`'s three `ChatCompletionClient`
    /// parameters.
    pub fn new(
        config: GuardConfig,
        primary_oracle: Arc<dyn Oracle>,
        chief_judge_oracle: Arc<dyn Oracle>,
        policy_extraction_oracle: Arc<dyn Oracle>,
        embedder: Arc<dyn EmbeddingFunction>,
    ) -> GuardResult<Self> {
        config.validate()?;
        let ingestion_chunk_size = config.ingestion_chunk_size;
        Ok(Self {
            force_message_check: config.force_message_check,
            context: ConversationContext::new(config.message_buffer_size),
            config,
            enabled: true,
            store: PredicateStore::new(),
            index: PredicateIndex::new(),
            sender_histories: HashMap::new(),
            threat_levels: HashMap::new(),
            tool_registry: HashMap::new(),
            verdict_cache: VerdictCache::new(),
            predicate_watcher: PredicateWatcher::new(primary_oracle.clone()),
            threat_watcher: ThreatWatcher::new(primary_oracle.clone()),
            judge: Judge::new(primary_oracle),
            chief_judge: Judge::new(chief_judge_oracle),
            embedder,
            ingestion: caliber_ingestion::PolicyIngestion::new(policy_extraction_oracle, ingestion_chunk_size),
        })
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn register_tool(&mut self, name: impl Into<ToolName>, description: impl Into<String>) {
        self.tool_registry.insert(name.into(), description.into());
    }

    pub fn register_tools(&mut self, tools: impl IntoIterator<Item = (ToolName, String)>) {
        for (name, description) in tools {
            self.tool_registry.insert(name, description);
        }
    }

    pub fn deactivate_policies(&mut self) {
        self.store.deactivate_policies();
    }

    pub fn activate_policy(&mut self, names: &[String]) {
        self.store.activate_policy(names);
    }

    /// Install an action-policy record set (spec.md §6 "Guard public
    /// surface"): each record's predicates are upserted wholesale and
    /// its logic installed under the record's own description as the
    /// rule name, mirroring `Guard.add_policy_from_dict`.
    pub async fn add_policy_from_dict(&mut self, records: &[caliber_ingestion::IngestionRecord]) -> GuardResult<()> {
        self.install_records(PolicyKind::Action, records).await
    }

    /// As [`Self::add_policy_from_dict`], but replaces the message
    /// policy set wholesale first (`Guard.add_message_policy_from_dict`
    /// resets `self.message_policy = dict()` before inserting).
    pub async fn add_message_policy_from_dict(&mut self, records: &[caliber_ingestion::IngestionRecord]) -> GuardResult<()> {
        self.store.reset_message_policies();
        self.install_records(PolicyKind::Message, records).await
    }

    async fn install_records(&mut self, kind: PolicyKind, records: &[caliber_ingestion::IngestionRecord]) -> GuardResult<()> {
        for record in records {
            for predicate in &record.predicates {
                self.store.upsert_predicate(
                    PredicateName::from(predicate.name()),
                    predicate.description(),
                    predicate.keywords().to_vec(),
                    predicate.default_value(),
                );
            }
            self.store.insert_rule(kind, record.description.clone(), record.logic.clone());
        }
        self.store.add_missing_predicates();
        self.index_new_predicates().await
    }

    /// Add any predicate present in the store but absent from the
    /// vector index (new upserts and auto-created predicates alike),
    /// mirroring the `self.collection.add(...)` call the source makes
    /// immediately on predicate creation.
    async fn index_new_predicates(&mut self) -> GuardResult<()> {
        let pending: Vec<(PredicateName, Predicate)> = self
            .store
            .predicates()
            .iter()
            .filter(|(name, _)| !self.index.contains(name.as_str()))
            .map(|(name, p)| (name.clone(), p.clone()))
            .collect();
        for (name, predicate) in pending {
            self.index
                .add(name.as_str().to_string(), predicate.index_document(), self.embedder.as_ref())
                .await
                .map_err(GuardError::Oracle)?;
        }
        Ok(())
    }

    /// Ingest a policy document via C9 and install it as the action
    /// policy set (`Guard.add_policy_from_file`).
    pub async fn add_policy_from_file(
        &mut self,
        path: &std::path::Path,
        cancellation_token: Option<&CancellationToken>,
    ) -> GuardResult<()> {
        let records = self.ingestion.extract_from_file(path, cancellation_token).await?;
        self.add_policy_from_dict(&records).await
    }

    /// As [`Self::add_policy_from_file`], for the message policy set.
    pub async fn add_message_policy_from_file(
        &mut self,
        path: &std::path::Path,
        cancellation_token: Option<&CancellationToken>,
    ) -> GuardResult<()> {
        let records = self.ingestion.extract_from_file(path, cancellation_token).await?;
        self.add_message_policy_from_dict(&records).await
    }

    fn resolve_k(&self, is_first_message: bool, caller_k: Option<i64>) -> i64 {
        if is_first_message {
            return -1;
        }
        caller_k.unwrap_or(self.config.default_predicate_update_size)
    }

    async fn build_predicate_subset(
        &self,
        message: &str,
        k: i64,
    ) -> GuardResult<BTreeMap<PredicateName, Predicate>> {
        if k < 0 {
            return Ok(self.store.predicates().clone());
        }
        let truncated: String = message.chars().take(self.config.similarity_query_truncation).collect();
        let result = self
            .index
            .query(&truncated, k as usize, self.embedder.as_ref())
            .await
            .map_err(GuardError::Oracle)?;
        let mut subset = BTreeMap::new();
        for id in result.ids {
            if let Some(predicate) = self.store.get(&id) {
                subset.insert(predicate.name.clone(), predicate.clone());
            }
        }
        Ok(subset)
    }

    fn agent_observation(&self) -> Observation {
        let recent: Vec<&str> = self.context.recent_messages().collect();
        Observation {
            initial_user_request: self.context.initial_message().unwrap_or("").to_string(),
            current_conversation: format!("{recent:?}"),
        }
    }

    fn threat_level_of(&self, agent: &AgentLabel) -> ThreatLevel {
        self.threat_levels.get(agent).copied().unwrap_or_default()
    }

    /// `handle_message` (spec.md §4.6), steps 1-10.
    pub async fn handle_message(
        &mut self,
        message: &str,
        k: Option<i64>,
        sender: Option<&AgentLabel>,
        recipient: Option<&AgentLabel>,
        cancellation_token: Option<&CancellationToken>,
    ) -> GuardResult<(bool, String)> {
        if !self.enabled {
            return Ok((true, String::new()));
        }
        if message.is_empty() || message == "None" {
            return Ok((true, String::new()));
        }

        let is_first_message = self.context.is_empty();
        self.context.push(message);
        let k = self.resolve_k(is_first_message, k);

        let subset = self.build_predicate_subset(message, k).await?;
        let observation = self.agent_observation();
        match self
            .predicate_watcher
            .watch(&subset, &observation, cancellation_token)
            .await
        {
            Ok(updates) => {
                for (name, value) in updates {
                    self.store.apply_valuation_update(&name, value);
                }
            }
            Err(OracleError::Cancelled) => return Err(GuardError::Oracle(OracleError::Cancelled)),
            Err(_) => {} // fail-open (spec.md §7): treated as "no change"
        }

        if let Some(sender) = sender {
            let history = self
                .sender_histories
                .entry(sender.clone())
                .or_insert_with(|| SenderHistory::new(self.config.per_sender_history_capacity));
            history.push(message);
            let current_level = self.threat_level_of(sender);
            match self
                .threat_watcher
                .assess(&history.as_observation_text(), current_level, cancellation_token)
                .await
            {
                Ok(new_level) => {
                    self.threat_levels.insert(sender.clone(), new_level);
                    if let Some(recipient) = recipient {
                        let recipient_level = self.threat_level_of(recipient);
                        self.threat_levels
                            .insert(recipient.clone(), ThreatLevel::contagion(recipient_level, new_level));
                    }
                }
                Err(OracleError::Cancelled) => return Err(GuardError::Oracle(OracleError::Cancelled)),
                Err(_) => {} // fail-open: threat level left unchanged
            }
        }

        let message_policies = self.store.message_policies();
        let threat_gate = match (sender, recipient) {
            (Some(s), Some(r)) => self.threat_level_of(s).value() > 2 || self.threat_level_of(r).value() > 2,
            _ => false,
        };
        let should_check =
            self.force_message_check || (message_policies.is_some() && sender.is_some() && recipient.is_some() && threat_gate);
        if !should_check {
            return Ok((true, String::new()));
        }

        let empty_policies = PolicySet::new();
        let policies = message_policies.unwrap_or(&empty_policies);
        let valuation = self.store.full_valuation();
        let fingerprint = Fingerprint::compute(PolicyKind::Message, &valuation, policies);
        let verdict = if let Some(cached) = self.verdict_cache.get(PolicyKind::Message, fingerprint) {
            cached.clone()
        } else {
            let (verdict, errors) = verify(policies, &valuation);
            for (rule, error) in errors {
                tracing::warn!(rule, %error, "skipping invalid message-policy rule");
            }
            self.verdict_cache.put(PolicyKind::Message, fingerprint, verdict.clone());
            verdict
        };
        if verdict.decision {
            return Ok((true, String::new()));
        }

        let observation_text = self.context.observation();
        match self
            .judge
            .judge_message(&observation_text, &verdict.violated, cancellation_token)
            .await
        {
            Ok(j) if j.decision => Ok((true, j.reason)),
            Ok(_) => match self
                .chief_judge
                .judge_message(&observation_text, &verdict.violated, cancellation_token)
                .await
            {
                Ok(chief) => Ok((chief.decision, chief.reason)),
                Err(OracleError::Cancelled) => Err(GuardError::Oracle(OracleError::Cancelled)),
                Err(_) => Ok((true, String::new())), // fail-open: treated as safe
            },
            Err(OracleError::Cancelled) => Err(GuardError::Oracle(OracleError::Cancelled)),
            Err(_) => Ok((true, String::new())), // fail-open: treated as safe
        }
    }

    /// `handle_action` (spec.md §4.6), steps 1-6.
    pub async fn handle_action(
        &mut self,
        action: &ToolName,
        arguments: &str,
        description: Option<&str>,
        sender: Option<&AgentLabel>,
        cancellation_token: Option<&CancellationToken>,
    ) -> GuardResult<(bool, String)> {
        if !self.enabled {
            return Ok((true, String::new()));
        }

        let tool_description = self
            .tool_registry
            .get(action)
            .cloned()
            .or_else(|| description.map(str::to_string))
            .unwrap_or_default();

        let observation_text = self.context.observation();
        let valuation = self.store.full_valuation();
        let policies = self.store.action_policies();
        let fingerprint = Fingerprint::compute(PolicyKind::Action, &valuation, policies);
        let verdict = if let Some(cached) = self.verdict_cache.get(PolicyKind::Action, fingerprint) {
            cached.clone()
        } else {
            let (verdict, errors) = verify(policies, &valuation);
            for (rule, error) in errors {
                tracing::warn!(rule, %error, "skipping invalid action-policy rule");
            }
            self.verdict_cache.put(PolicyKind::Action, fingerprint, verdict.clone());
            verdict
        };
        if verdict.decision {
            return Ok((true, String::new()));
        }

        let threat_level = sender.map(|s| self.threat_level_of(s)).unwrap_or_default();
        let tool = ToolDescriptor {
            name: action.to_string(),
            description: tool_description,
            arguments: arguments.to_string(),
        };

        match self
            .judge
            .judge_action(&observation_text, threat_level, &verdict.violated, &tool, cancellation_token)
            .await
        {
            Ok(j) if j.decision => Ok((true, j.reason)),
            Ok(_) => match self
                .chief_judge
                .judge_action(&observation_text, threat_level, &verdict.violated, &tool, cancellation_token)
                .await
            {
                Ok(chief) => Ok((chief.decision, chief.reason)),
                Err(OracleError::Cancelled) => Err(GuardError::Oracle(OracleError::Cancelled)),
                Err(_) => Ok((true, String::new())), // fail-open: treated as safe
            },
            Err(OracleError::Cancelled) => Err(GuardError::Oracle(OracleError::Cancelled)),
            Err(_) => Ok((true, String::new())), // fail-open: treated as safe
        }
    }
}
