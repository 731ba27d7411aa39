//! Lazily loaded, expandable groups.
//!
//! An [`Accordion`] groups a collection by a secondary key (for the Events view,
//! the month) and gives every group its own [`CollectionLoader`]. Groups are
//! only instantiated on first expansion and only for keys inside the current
//! scope (for the Events view, a locale and a year). Collapsing a group keeps
//! its items; changing the scope drops every group.
//!
//! [`Expansion`] is the open/closed bookkeeping on its own, for views whose
//! groups are not backed by loaders.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
};

use crate::{
  Error, Result,
  event::EventRecord,
  loader::{CollectionLoader, Completion, LoaderPhase, PageTicket},
  locale::Locale,
  query::{EventQuery, Page},
};

// ─── Expansion ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandPolicy {
  /// Opening a group closes every other one.
  Exclusive,
  /// Any number of groups may be open.
  Independent,
}

#[derive(Debug, Clone)]
pub struct Expansion<K> {
  policy: ExpandPolicy,
  open:   BTreeSet<K>,
}

impl<K: Ord + Clone> Expansion<K> {
  pub fn new(policy: ExpandPolicy) -> Self {
    Self { policy, open: BTreeSet::new() }
  }

  pub fn policy(&self) -> ExpandPolicy { self.policy }

  /// Flip `key`. Returns whether it is now expanded.
  pub fn toggle(&mut self, key: &K) -> bool {
    if self.open.remove(key) {
      return false;
    }
    if self.policy == ExpandPolicy::Exclusive {
      self.open.clear();
    }
    self.open.insert(key.clone());
    true
  }

  pub fn is_expanded(&self, key: &K) -> bool { self.open.contains(key) }

  pub fn expanded(&self) -> impl Iterator<Item = &K> { self.open.iter() }

  pub fn collapse_all(&mut self) { self.open.clear(); }
}

// ─── Keys and planning ───────────────────────────────────────────────────────

/// A group identifier that belongs to exactly one scope.
pub trait GroupKey: Ord + Clone + fmt::Debug {
  type Scope: PartialEq + Clone + fmt::Debug;

  fn scope(&self) -> Self::Scope;
}

/// One month of the Events view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
  pub locale: Locale,
  pub year:   i32,
  pub month:  u32,
}

impl GroupKey for MonthKey {
  type Scope = (Locale, i32);

  fn scope(&self) -> Self::Scope { (self.locale, self.year) }
}

impl fmt::Display for MonthKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}-{:02}", self.locale, self.year, self.month)
  }
}

/// Builds the query for a group when it is first expanded.
pub trait GroupPlanner<K> {
  fn plan(&self, key: &K) -> Result<EventQuery>;
}

impl<K, F> GroupPlanner<K> for F
where
  F: Fn(&K) -> Result<EventQuery>,
{
  fn plan(&self, key: &K) -> Result<EventQuery> { self(key) }
}

// ─── Accordion ───────────────────────────────────────────────────────────────

/// A page request issued on behalf of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTicket<K> {
  pub key:    K,
  epoch:      u64,
  pub ticket: PageTicket,
}

pub struct Accordion<K: GroupKey, P> {
  scope:     K::Scope,
  planner:   P,
  page_size: u32,
  expansion: Expansion<K>,
  groups:    BTreeMap<K, CollectionLoader>,
  epoch:     u64,
}

impl<K: GroupKey, P: GroupPlanner<K>> Accordion<K, P> {
  pub fn new(scope: K::Scope, planner: P, policy: ExpandPolicy, page_size: u32) -> Self {
    Self {
      scope,
      planner,
      page_size,
      expansion: Expansion::new(policy),
      groups: BTreeMap::new(),
      epoch: 0,
    }
  }

  pub fn scope(&self) -> &K::Scope { &self.scope }

  /// Move to another scope. Every group is dropped and its outstanding
  /// requests become stale. Setting the same scope again is a no-op.
  pub fn set_scope(&mut self, scope: K::Scope) {
    if scope == self.scope {
      return;
    }
    tracing::debug!(?scope, dropped = self.groups.len(), "accordion scope changed");
    self.scope = scope;
    self.groups.clear();
    self.expansion.collapse_all();
    self.epoch += 1;
  }

  fn check_scope(&self, key: &K) -> Result<()> {
    if key.scope() == self.scope {
      Ok(())
    } else {
      Err(Error::GroupOutOfScope(format!("{key:?}")))
    }
  }

  fn dispatch(&mut self, key: &K) -> Option<GroupTicket<K>> {
    let ticket = self.groups.get_mut(key)?.begin_next()?;
    Some(GroupTicket { key: key.clone(), epoch: self.epoch, ticket })
  }

  /// Expand or collapse `key`. Expanding a group that has never loaded
  /// anything dispatches its first page.
  pub fn toggle(&mut self, key: K) -> Result<Option<GroupTicket<K>>> {
    self.check_scope(&key)?;
    if !self.expansion.is_expanded(&key) && !self.groups.contains_key(&key) {
      let query = self.planner.plan(&key)?;
      self
        .groups
        .insert(key.clone(), CollectionLoader::new(query, self.page_size));
    }
    if !self.expansion.toggle(&key) {
      return Ok(None);
    }
    let untouched = self
      .groups
      .get(&key)
      .is_some_and(|g| g.items().is_empty() && g.phase() == LoaderPhase::Idle);
    Ok(if untouched { self.dispatch(&key) } else { None })
  }

  /// Request the next page of an expanded group.
  pub fn load_more(&mut self, key: &K) -> Result<Option<GroupTicket<K>>> {
    self.check_scope(key)?;
    if !self.expansion.is_expanded(key) {
      return Ok(None);
    }
    Ok(self.dispatch(key))
  }

  /// Apply a response. Tickets from before the last scope change are stale.
  pub fn complete(
    &mut self,
    ticket: GroupTicket<K>,
    result: Result<Page<EventRecord>>,
  ) -> Result<Completion> {
    if ticket.epoch != self.epoch {
      return Ok(Completion::Stale);
    }
    match self.groups.get_mut(&ticket.key) {
      Some(group) => group.complete(ticket.ticket, result),
      None => Ok(Completion::Stale),
    }
  }

  pub fn group(&self, key: &K) -> Option<&CollectionLoader> { self.groups.get(key) }

  pub fn is_expanded(&self, key: &K) -> bool { self.expansion.is_expanded(key) }

  pub fn expanded(&self) -> impl Iterator<Item = &K> { self.expansion.expanded() }
}

impl<K: GroupKey, P> fmt::Debug for Accordion<K, P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Accordion")
      .field("scope", &self.scope)
      .field("groups", &self.groups.keys().collect::<Vec<_>>())
      .field("epoch", &self.epoch)
      .finish_non_exhaustive()
  }
}
