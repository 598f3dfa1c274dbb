//! The incidence graph of a CNF formula.
//!
//! Variables and clauses are the two node kinds of a bipartite graph. A variable is connected to
//! every clause it occurs in, the sign of the occurrence is recorded separately. The graph
//! supports destructive updates that are undone through three independent backup channels:
//!
//! * literal removal ([`IncidenceGraph::remove_literal`]), a stack unwound in strict reverse order,
//! * variable merging ([`IncidenceGraph::merge_variable_simplification`]), one batch at a time,
//! * subsumption ([`IncidenceGraph::remove_subsumed_clause_variable`]), accumulated until restored.
//!
//! Restoring the channels in the reverse order of the mutations returns the graph to exactly the
//! state it had before.
use std::cell::Cell;
use std::cmp::Reverse;
use std::rc::Rc;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use crate::cnf::CnfFormula;
use crate::config::GraphConfig;
use crate::context::{GraphContext, OccurrencesP, StoreP};
use crate::error::{GraphError, Result};
use crate::horn::HornRecognizer;
use crate::lit::{Lit, Var};
use crate::stats::{Operation, Statistics};
use crate::store::{ClauseId, ClauseStore, LitSet};

mod assign;
mod components;
mod edit;
mod merge;
mod subsume;

pub use subsume::{is_subset, RedundancyPolicy};

/// A node of the incidence graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    Variable(Var),
    Clause(ClauseId),
}

/// Comparable copy of the complete graph structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub variables: Vec<Var>,
    pub clauses: Vec<(ClauseId, Vec<Lit>)>,
    /// Sorted clause ids for each length, up to the longest clause.
    pub length_index: Vec<Vec<ClauseId>>,
    /// Sorted clause ids of the static polarity lists, for each literal with a non-empty list.
    pub static_polarity: Vec<(Lit, Vec<ClauseId>)>,
}

/// Mutable incidence graph of a CNF formula.
pub struct IncidenceGraph {
    ctx: Box<GraphContext>,
    config: GraphConfig,
    stats: Statistics,
    horn: Option<Rc<HornRecognizer>>,
    /// Literals assigned in the graphs this component was split off from.
    inherited: Rc<[Lit]>,
    /// A variable merge was pending in the graph this component was split off from.
    inherited_merge: bool,
    /// Set when the graph is known to form a single component, cleared by every mutation.
    known_connected: Cell<bool>,
}

impl Default for IncidenceGraph {
    fn default() -> IncidenceGraph {
        IncidenceGraph::new(GraphConfig::default(), Statistics::disabled())
    }
}

impl IncidenceGraph {
    /// Create an empty graph.
    pub fn new(config: GraphConfig, stats: Statistics) -> IncidenceGraph {
        IncidenceGraph {
            ctx: Box::default(),
            config,
            stats,
            horn: None,
            inherited: Rc::from(vec![]),
            inherited_merge: false,
            known_connected: Cell::new(false),
        }
    }

    /// Create the graph of a formula. The clause at position `i` gets the id `i`.
    ///
    /// A variable occurring in both polarities in one clause keeps its first occurrence.
    pub fn from_formula(
        formula: &CnfFormula,
        config: GraphConfig,
        stats: Statistics,
    ) -> Result<IncidenceGraph> {
        let mut graph = IncidenceGraph::new(config, stats);
        for (index, clause) in formula.iter().enumerate() {
            graph.add_clause(ClauseId::from_index(index), clause.iter().cloned())?;
        }
        Ok(graph)
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The statistics sink shared with all graphs derived from this one.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Live variables and clauses.
    pub fn store(&self) -> &ClauseStore {
        self.ctx.store()
    }

    /// Live variables in increasing order.
    pub fn variables(&self) -> impl Iterator<Item = Var> + '_ {
        self.store().variables()
    }

    /// Live clause ids in increasing order.
    pub fn clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.store().clauses()
    }

    pub fn variable_count(&self) -> usize {
        self.store().variable_count()
    }

    pub fn clause_count(&self) -> usize {
        self.store().clause_count()
    }

    pub fn contains_variable(&self, var: Var) -> bool {
        self.store().contains_variable(var)
    }

    pub fn contains_clause(&self, id: ClauseId) -> bool {
        self.store().contains_clause(id)
    }

    pub fn clause(&self, id: ClauseId) -> Result<&LitSet> {
        self.store().clause(id)
    }

    pub fn sorted_clause(&self, id: ClauseId) -> Result<&[Lit]> {
        self.store().sorted_clause(id)
    }

    pub fn clause_len(&self, id: ClauseId) -> Result<usize> {
        self.store().clause_len(id)
    }

    /// Whether some live clause lost all its literals.
    pub fn contains_empty_clause(&self) -> bool {
        self.store().number_of_clauses_with_len(0) > 0
    }

    /// Add a variable node without edges.
    pub fn add_variable(&mut self, var: Var) -> Result<()> {
        if self.ctx.backups().is_assigned(var) {
            return Err(GraphError::AlreadyAssigned(var));
        }
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(StoreP).add_variable(var)?;
        ctx.part_mut(OccurrencesP).ensure_var_count(var.index() + 1);
        self.known_connected.set(false);
        Ok(())
    }

    /// Add a clause node without edges.
    pub fn add_clause_id(&mut self, id: ClauseId) -> Result<()> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(StoreP).add_clause_id(id)?;
        self.known_connected.set(false);
        Ok(())
    }

    /// Add a clause node connected to the given literals.
    pub fn add_clause(&mut self, id: ClauseId, lits: impl IntoIterator<Item = Lit>) -> Result<()> {
        self.add_clause_id(id)?;
        for lit in lits {
            self.add_edge(lit, id)?;
        }
        Ok(())
    }

    /// Connect a literal to a clause, creating missing nodes.
    ///
    /// Does nothing if the variable is connected to the clause already, whatever the polarity.
    /// These edges are not backed up.
    pub fn add_edge(&mut self, lit: Lit, id: ClauseId) -> Result<()> {
        let var = lit.var();
        if self.ctx.backups().is_assigned(var) {
            return Err(GraphError::AlreadyAssigned(var));
        }
        if !self.contains_variable(var) {
            self.add_variable(var)?;
        }
        if !self.contains_clause(id) {
            self.add_clause_id(id)?;
        }

        let mut ctx = self.ctx.into_partial_ref_mut();
        let content = ctx.part(StoreP).clause(id)?;
        if content.contains(&lit) || content.contains(&!lit) {
            return Ok(());
        }
        ctx.part_mut(StoreP).insert_lit(id, lit)?;
        let occurrences = ctx.part_mut(OccurrencesP);
        occurrences.insert_live(lit, id);
        occurrences.record_static(lit, id);
        self.known_connected.set(false);
        Ok(())
    }

    /// Disconnect a literal from a clause. This edit is not backed up.
    pub fn remove_edge(&mut self, lit: Lit, id: ClauseId) -> Result<()> {
        if !self.contains_clause(id) {
            return Err(GraphError::ClauseNotFound(id));
        }
        let mut ctx = self.ctx.into_partial_ref_mut();
        edit::detach_edge(ctx.borrow(), lit, id, &mut vec![])?;
        self.known_connected.set(false);
        Ok(())
    }

    /// Neighbors of a node: the clauses of a variable or the variables of a clause.
    pub fn neighbors(&self, node: Node) -> Result<Vec<Node>> {
        match node {
            Node::Variable(var) => {
                if !self.contains_variable(var) {
                    return Err(GraphError::VariableNotFound(var));
                }
                let mut clauses: Vec<ClauseId> =
                    self.ctx.occurrences().clauses_of(var).collect();
                clauses.sort_unstable();
                Ok(clauses.into_iter().map(Node::Clause).collect())
            }
            Node::Clause(id) => Ok(self
                .sorted_clause(id)?
                .iter()
                .map(|lit| Node::Variable(lit.var()))
                .collect()),
        }
    }

    /// Sign of the occurrence of `var` in clause `id`, taken from the static polarity lists.
    pub fn edge_polarity(&self, var: Var, id: ClauseId) -> Result<bool> {
        let content = self.clause(id)?;
        if !content.contains(&var.positive()) && !content.contains(&var.negative()) {
            return Err(GraphError::EdgeNotFound(var.positive(), id));
        }
        self.ctx
            .occurrences()
            .edge_polarity(var, id)
            .ok_or_else(|| corrupt!("no recorded sign for variable {} in clause {}", var, id))
    }

    /// Make `lit` true, removing its variable, the satisfied clauses and `!lit` from the others.
    ///
    /// Returns the variables that lost all their edges and were removed as well, in increasing
    /// order. Those count as assigned until the literal is restored. With a policy, clauses made
    /// redundant by the shortened clauses are removed too.
    pub fn remove_literal(
        &mut self,
        lit: Lit,
        policy: Option<RedundancyPolicy>,
    ) -> Result<Vec<Var>> {
        let _timer = self.stats.time(Operation::RemoveLiteral);
        let mut ctx = self.ctx.into_partial_ref_mut();
        let isolated = assign::remove_literal(ctx.borrow(), lit, policy)?;
        self.stats.count(Operation::RemoveLiteral, isolated.len());
        self.mutated()?;
        Ok(isolated)
    }

    /// Undo the most recent [`remove_literal`](IncidenceGraph::remove_literal).
    ///
    /// Fails with [`GraphError::NotLastRemoved`] unless `lit` is the most recently removed literal
    /// still removed.
    /// Fails with [`GraphError::RestoreOrder`] while a later merge or subsumption removal is still
    /// pending. A failing restore leaves the graph unchanged.
    pub fn restore_backup_literal(&mut self, lit: Lit) -> Result<()> {
        let _timer = self.stats.time(Operation::RestoreLiteral);
        let mut ctx = self.ctx.into_partial_ref_mut();
        assign::restore_literal(ctx.borrow(), lit)?;
        self.mutated()
    }

    /// Removed literals that are not restored yet, oldest first.
    pub fn assigned_literals(&self) -> Vec<Lit> {
        self.ctx.backups().assigned_lits().collect()
    }

    /// Whether a variable was removed by a literal removal, directly or as isolated variable.
    pub fn is_assigned(&self, var: Var) -> bool {
        self.ctx.backups().is_assigned(var)
    }

    /// Replace variables by equivalent representatives.
    ///
    /// `mapping` pairs each representative with its class. A class member `m` states
    /// `var(m) == representative` when positive and `var(m) == !representative` when negative.
    /// Undone as a whole by
    /// [`restore_backup_variable_simplification`](IncidenceGraph::restore_backup_variable_simplification).
    pub fn merge_variable_simplification(&mut self, mapping: &[(Var, Vec<Lit>)]) -> Result<()> {
        let _timer = self.stats.time(Operation::MergeVariables);
        let mut ctx = self.ctx.into_partial_ref_mut();
        merge::merge_variables(ctx.borrow(), mapping)?;
        self.stats.count(
            Operation::MergeVariables,
            mapping.iter().map(|(_, class)| class.len()).sum(),
        );
        self.mutated()
    }

    pub fn restore_backup_variable_simplification(&mut self) -> Result<()> {
        let _timer = self.stats.time(Operation::RestoreMerge);
        let mut ctx = self.ctx.into_partial_ref_mut();
        merge::restore_merge(ctx.borrow())?;
        self.mutated()
    }

    /// Clauses whose variables are a superset of another live clause's variables, ignoring signs.
    ///
    /// Of two clauses with the same variables the one with the larger id is listed. Nothing is
    /// removed.
    pub fn subsumption_variable(&self) -> Vec<ClauseId> {
        let _timer = self.stats.time(Operation::Subsumption);
        let candidates: Vec<ClauseId> = self.clauses().collect();
        let mut ctx = self.ctx.into_partial_ref();
        let subsumed = subsume::redundant_clauses(
            ctx.borrow(),
            &candidates,
            RedundancyPolicy::VariableSubsumption,
        );
        self.stats.count(Operation::Subsumption, subsumed.len());
        subsumed
    }

    /// Remove a clause through the subsumption backup channel.
    pub fn remove_subsumed_clause_variable(&mut self, id: ClauseId) -> Result<()> {
        let _timer = self.stats.time(Operation::RemoveSubsumed);
        let mut ctx = self.ctx.into_partial_ref_mut();
        subsume::remove_subsumed(ctx.borrow(), id)?;
        self.stats.count(Operation::RemoveSubsumed, 1);
        self.mutated()
    }

    /// Restore every clause removed through the subsumption channel.
    pub fn restore_backup_subsumption_variable(&mut self) -> Result<()> {
        let _timer = self.stats.time(Operation::RestoreSubsumption);
        let mut ctx = self.ctx.into_partial_ref_mut();
        subsume::restore_subsumed(ctx.borrow())?;
        self.mutated()
    }

    /// Variable sets of the connected components.
    ///
    /// Each set is sorted, sets are ordered by their smallest variable. A graph known to be
    /// connected returns all its variables without traversal.
    pub fn connected_components(&self) -> Vec<Vec<Var>> {
        let _timer = self.stats.time(Operation::Components);
        if self.known_connected.get() {
            let variables: Vec<Var> = self.variables().collect();
            return if variables.is_empty() {
                vec![]
            } else {
                vec![variables]
            };
        }

        let mut ctx = self.ctx.into_partial_ref();
        let components = components::connected_components(ctx.borrow());
        self.known_connected.set(components.len() == 1);
        self.stats.count(Operation::Components, components.len());
        components
    }

    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// One independent graph per connected component.
    ///
    /// The new graphs keep the clause ids, share the Horn recognizer and the statistics sink and
    /// remember the assigned literals of this graph. They have no backups of their own.
    ///
    /// Clauses without literals belong to no component and are not copied, so callers check
    /// [`contains_empty_clause`](IncidenceGraph::contains_empty_clause) before splitting.
    pub fn create_incidence_graphs_for_components(&self) -> Result<Vec<IncidenceGraph>> {
        let components = self.connected_components();
        let _timer = self.stats.time(Operation::CreateComponents);

        let inherited: Rc<[Lit]> = self
            .inherited
            .iter()
            .cloned()
            .chain(self.ctx.backups().assigned_lits())
            .collect::<Vec<_>>()
            .into();
        let inherited_merge = self.inherited_merge || self.ctx.backups().simplification_pending();

        let mut graphs = Vec::with_capacity(components.len());
        for component in components {
            let mut graph = IncidenceGraph::new(self.config.clone(), self.stats.clone());
            graph.horn = self.horn.clone();
            graph.inherited = inherited.clone();
            graph.inherited_merge = inherited_merge;

            let mut clauses: Vec<ClauseId> = component
                .iter()
                .flat_map(|&var| self.ctx.occurrences().clauses_of(var))
                .collect();
            clauses.sort_unstable();
            clauses.dedup();

            for &var in component.iter() {
                graph.add_variable(var)?;
            }
            for &id in clauses.iter() {
                graph.add_clause(id, self.sorted_clause(id)?.iter().cloned())?;
            }

            graph.known_connected.set(true);
            graphs.push(graph);
        }

        self.stats
            .count(Operation::CreateComponents, graphs.len());
        Ok(graphs)
    }

    /// Number of live clauses containing `lit`.
    pub fn literal_number_of_occurrences(&self, lit: Lit) -> usize {
        self.ctx.occurrences().live(lit).len()
    }

    /// Sum of the lengths of the live clauses containing `lit`.
    pub fn literal_sum_lengths_clauses(&self, lit: Lit) -> usize {
        self.ctx
            .occurrences()
            .live(lit)
            .iter()
            .map(|&id| {
                let len = self.clause_len(id);
                debug_assert!(len.is_ok(), "{} listed in removed clause {}", lit, id);
                len.unwrap_or(0)
            })
            .sum()
    }

    /// The live variable with the most edges, the smallest one on ties.
    pub fn variable_with_most_occurrences(&self) -> Option<Var> {
        let occurrences = self.ctx.occurrences();
        self.variables()
            .max_by_key(|&var| (occurrences.degree(var), Reverse(var)))
    }

    /// Literals occurring in binary clauses, sorted and without duplicates.
    pub fn literals_in_binary_clauses(&self) -> Vec<Lit> {
        let store = self.store();
        let mut lits: Vec<Lit> = store
            .clauses_with_len(2)
            .flat_map(|id| store.clause(id).into_iter().flatten().cloned())
            .collect();
        lits.sort_unstable();
        lits.dedup();
        lits
    }

    /// Build the renamable-Horn recognizer for the current clauses.
    ///
    /// Component graphs created afterwards share it. Can be done once per graph.
    pub fn init_renamable_horn(&mut self) -> Result<()> {
        if self.horn.is_some() {
            return Err(GraphError::AlreadyInitialized);
        }
        let recognizer = HornRecognizer::new(self.store())?;
        log::info!(
            "built renamable-Horn encoding with {} variables and {} binary clauses",
            recognizer.var_count(),
            recognizer.clause_count()
        );
        self.horn = Some(Rc::new(recognizer));
        Ok(())
    }

    pub fn horn_initialized(&self) -> bool {
        self.horn.is_some()
    }

    /// A set of variables whose renaming turns the live clauses into Horn clauses.
    ///
    /// `None` if there is no such set. Only live variables are listed.
    pub fn is_renamable_horn_formula(&self) -> Result<Option<Vec<Var>>> {
        let horn = self.horn.as_ref().ok_or(GraphError::NotInitialized)?;
        if self.inherited_merge || self.ctx.backups().simplification_pending() {
            return Err(GraphError::SimplificationPending);
        }
        let _timer = self.stats.time(Operation::HornQuery);
        let assigned = self
            .inherited
            .iter()
            .cloned()
            .chain(self.ctx.backups().assigned_lits());
        horn.renaming(self.store(), assigned)
    }

    /// The live clauses as a formula, ordered by clause id with sorted literals.
    pub fn to_formula(&self) -> CnfFormula {
        let mut formula = CnfFormula::new();
        for id in self.clauses() {
            formula.add_clause(self.sorted_clause(id).unwrap_or(&[]));
        }
        formula
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let store = self.store();
        let occurrences = self.ctx.occurrences();

        let clauses = store
            .clauses()
            .map(|id| (id, store.sorted_clause(id).map(<[Lit]>::to_vec).unwrap_or_default()))
            .collect();

        let mut length_index: Vec<Vec<ClauseId>> = (0..=store.max_len())
            .map(|len| {
                let mut ids: Vec<ClauseId> = store.clauses_with_len(len).collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        while length_index.last().map_or(false, |ids| ids.is_empty()) {
            length_index.pop();
        }

        let static_polarity = (0..store.var_slots() * 2)
            .map(Lit::from_code)
            .filter_map(|lit| {
                let mut ids: Vec<ClauseId> =
                    occurrences.static_clauses(lit).iter().cloned().collect();
                ids.sort_unstable();
                if ids.is_empty() {
                    None
                } else {
                    Some((lit, ids))
                }
            })
            .collect();

        GraphSnapshot {
            variables: store.variables().collect(),
            clauses,
            length_index,
            static_polarity,
        }
    }

    /// Check the length index and that every live edge is listed exactly once in the live and the
    /// static occurrence lists.
    pub fn check_invariants(&self) -> Result<()> {
        let store = self.store();
        let occurrences = self.ctx.occurrences();
        let backups = self.ctx.backups();

        store.check_len_index()?;

        let mut edges = 0;
        for id in store.clauses() {
            for &lit in store.sorted_clause(id)? {
                edges += 1;
                if !store.contains_variable(lit.var()) {
                    return Err(corrupt!("clause {} contains removed variable {}", id, lit.var()));
                }
                if !occurrences.live(lit).contains(&id) {
                    return Err(corrupt!("edge {} of clause {} is not listed live", lit, id));
                }
                if occurrences.edge_polarity(lit.var(), id) != Some(lit.is_positive()) {
                    return Err(corrupt!("edge {} of clause {} has no unique sign", lit, id));
                }
            }
        }

        for var in store.variables() {
            if let Some(id) = occurrences.clauses_of(var).find(|&id| !store.contains_clause(id)) {
                return Err(corrupt!("variable {} is listed in removed clause {}", var, id));
            }
        }

        let listed: usize = store
            .variables()
            .map(|var| occurrences.degree(var))
            .sum();
        if listed != edges {
            return Err(corrupt!(
                "{} live occurrences listed for {} edges",
                listed,
                edges
            ));
        }

        if let Some(var) = store.variables().find(|&var| backups.is_assigned(var)) {
            return Err(corrupt!("assigned variable {} is live", var));
        }
        Ok(())
    }

    /// Bookkeeping after a backed up mutation.
    fn mutated(&self) -> Result<()> {
        self.known_connected.set(false);
        if self.config.check_invariants {
            self.check_invariants()?;
        }
        Ok(())
    }
}
