//! Incremental shortest-path maintenance for a link-state topology
//!
//! [`Topology`] keeps a single-source shortest-path tree up to date while
//! edges are added, removed or re-costed, using the Ramalingam-Reps
//! algorithm. Only the vertices whose distance can change are touched.
//!
//! # Design
//!
//! Every vertex embeds a [`Links`] value, its position in the frontier. The
//! frontier is one [`LinkedBinaryHeap`] keyed by tentative distance, so
//! improving a vertex is a `decrease_key` on its own record with no handle
//! map on the side.
//!
//! - **Cheaper path** (new edge or lowered cost): the head is seeded into the
//!   frontier and improvements propagate Dijkstra-style.
//! - **Lost path** (removed edge or raised cost): vertices left without any
//!   shortest-path in-edge from an unaffected vertex are marked affected,
//!   each gets a distance estimate from its unaffected in-neighbours, and
//!   the frontier settles the affected region.
//!
//! Edge costs must be positive, which keeps the shortest-path graph acyclic.
//!
//! # Example
//!
//! ```rust
//! use intrusive_spf_heap::routing::{Distance, TopologyBuilder};
//!
//! let mut topology = TopologyBuilder::new(4)
//!     .source(0)
//!     .edge(0, 1, 1)
//!     .edge(1, 2, 1)
//!     .edge(0, 2, 5)
//!     .build()
//!     .unwrap();
//! assert_eq!(topology.distance(2), Some(Distance::Finite(2)));
//!
//! topology.remove_edge(1, 2).unwrap();
//! assert_eq!(topology.distance(2), Some(Distance::Finite(5)));
//!
//! topology.add_edge(2, 3, 2).unwrap();
//! assert_eq!(topology.path_to(3), Some(vec![0, 2, 3]));
//! ```

use std::cmp::Ordering;
use std::fmt;

use log::{debug, trace};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::RoutingError;
use crate::linked_heap::LinkedBinaryHeap;
use crate::storage::{Links, NodeStore};

/// Index of a vertex in a [`Topology`]
pub type VertexId = usize;

/// Cost of a single edge
pub type Cost = u32;

/// Distance from the source
///
/// Orders every finite distance before [`Distance::Unreachable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Distance {
    Finite(u64),
    #[default]
    Unreachable,
}

impl Distance {
    pub const ZERO: Distance = Distance::Finite(0);

    /// Distance after following an edge of the given cost
    #[inline]
    pub fn plus(self, cost: Cost) -> Distance {
        match self {
            Distance::Finite(d) => Distance::Finite(d.saturating_add(u64::from(cost))),
            Distance::Unreachable => Distance::Unreachable,
        }
    }

    #[inline]
    pub fn is_reachable(self) -> bool {
        matches!(self, Distance::Finite(_))
    }

    /// The finite value, if any
    #[inline]
    pub fn finite(self) -> Option<u64> {
        match self {
            Distance::Finite(d) => Some(d),
            Distance::Unreachable => None,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(d) => write!(f, "{}", d),
            Distance::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    peer: VertexId,
    cost: Cost,
}

#[derive(Debug, Clone)]
struct Vertex {
    distance: Distance,
    predecessor: Option<VertexId>,
    outbound: SmallVec<[Edge; 4]>,
    inbound: SmallVec<[Edge; 4]>,
    /// Position in the frontier heap
    frontier: Links<VertexId>,
}

impl Vertex {
    fn new() -> Self {
        Vertex {
            distance: Distance::Unreachable,
            predecessor: None,
            outbound: SmallVec::new(),
            inbound: SmallVec::new(),
            frontier: Links::new(),
        }
    }
}

/// Vertex table, the node store of the frontier heap
#[derive(Debug, Clone, Default)]
struct Vertices(Vec<Vertex>);

impl NodeStore for Vertices {
    type Id = VertexId;
    type Key = Distance;

    #[inline]
    fn links(&self, id: VertexId) -> &Links<VertexId> {
        &self.0[id].frontier
    }

    #[inline]
    fn links_mut(&mut self, id: VertexId) -> &mut Links<VertexId> {
        &mut self.0[id].frontier
    }

    #[inline]
    fn key(&self, id: VertexId) -> &Distance {
        &self.0[id].distance
    }
}

/// Directed weighted graph with a maintained shortest-path tree
///
/// After every public operation, each vertex carries its exact distance
/// from the source and a predecessor on one shortest path, and the frontier
/// is empty.
#[derive(Debug)]
pub struct Topology {
    vertices: Vertices,
    source: VertexId,
    frontier: LinkedBinaryHeap<Vertices>,
}

impl Topology {
    /// Creates a topology of isolated vertices
    ///
    /// # Errors
    /// Returns [`RoutingError::UnknownVertex`] if `source` is out of range.
    pub fn new(vertex_count: usize, source: VertexId) -> Result<Self, RoutingError> {
        if source >= vertex_count {
            return Err(RoutingError::UnknownVertex(source));
        }
        let mut topology = Topology {
            vertices: Vertices((0..vertex_count).map(|_| Vertex::new()).collect()),
            source,
            frontier: LinkedBinaryHeap::new(),
        };
        topology.recalculate_shortest_paths();
        Ok(topology)
    }

    /// Appends an isolated, unreachable vertex
    pub fn add_vertex(&mut self) -> VertexId {
        self.vertices.0.push(Vertex::new());
        self.vertices.0.len() - 1
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.0.len()
    }

    pub fn source(&self) -> VertexId {
        self.source
    }

    /// Cost of the edge from `tail` to `head`, if present
    pub fn edge_cost(&self, tail: VertexId, head: VertexId) -> Option<Cost> {
        self.vertices
            .0
            .get(tail)?
            .outbound
            .iter()
            .find(|edge| edge.peer == head)
            .map(|edge| edge.cost)
    }

    /// All edges as `(tail, head, cost)`
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId, Cost)> + '_ {
        self.vertices
            .0
            .iter()
            .enumerate()
            .flat_map(|(tail, v)| v.outbound.iter().map(move |e| (tail, e.peer, e.cost)))
    }

    /// Distance of `v` from the source, `None` for an unknown vertex
    pub fn distance(&self, v: VertexId) -> Option<Distance> {
        self.vertices.0.get(v).map(|vertex| vertex.distance)
    }

    /// Distances of every vertex, indexed by vertex id
    pub fn distances(&self) -> Vec<Distance> {
        self.vertices.0.iter().map(|v| v.distance).collect()
    }

    /// Previous hop on a shortest path to `v`
    ///
    /// `None` for the source, for unreachable vertices and for unknown ids.
    pub fn predecessor(&self, v: VertexId) -> Option<VertexId> {
        self.vertices.0.get(v)?.predecessor
    }

    /// Shortest path from the source to `v`, both inclusive
    pub fn path_to(&self, v: VertexId) -> Option<Vec<VertexId>> {
        if !self.distance(v)?.is_reachable() {
            return None;
        }

        let mut path = vec![v];
        let mut current = v;
        while let Some(prev) = self.predecessor(current) {
            if path.len() > self.vertex_count() {
                return None;
            }
            path.push(prev);
            current = prev;
        }

        path.reverse();
        Some(path)
    }

    /// Recomputes every distance from scratch with Dijkstra's algorithm
    pub fn recalculate_shortest_paths(&mut self) {
        self.frontier.clear(&mut self.vertices);
        for vertex in self.vertices.0.iter_mut() {
            vertex.distance = Distance::Unreachable;
            vertex.predecessor = None;
        }

        let source = self.source;
        self.vertices.0[source].distance = Distance::ZERO;
        self.enqueue(source);
        self.propagate();
        debug!("full shortest-path computation over {} vertices", self.vertex_count());
    }

    /// Adds the edge `tail -> head`, or re-costs it if it already exists
    ///
    /// # Errors
    /// Fails on unknown vertices, self-loops and zero costs; the topology
    /// is left unchanged.
    pub fn add_edge(
        &mut self,
        tail: VertexId,
        head: VertexId,
        cost: Cost,
    ) -> Result<(), RoutingError> {
        self.validate_edge(tail, head, cost)?;
        if self.edge_cost(tail, head).is_some() {
            return self.set_edge_cost(tail, head, cost).map(|_| ());
        }

        self.vertices.0[tail].outbound.push(Edge { peer: head, cost });
        self.vertices.0[head].inbound.push(Edge { peer: tail, cost });
        debug!("edge {} -> {} added with cost {}", tail, head, cost);

        self.improve_through(tail, head, cost);
        Ok(())
    }

    /// Removes the edge `tail -> head`, returning its cost
    ///
    /// # Errors
    /// Returns [`RoutingError::UnknownEdge`] if no such edge exists.
    pub fn remove_edge(&mut self, tail: VertexId, head: VertexId) -> Result<Cost, RoutingError> {
        self.check_vertex(tail)?;
        self.check_vertex(head)?;

        let vertices = &mut self.vertices.0;
        let position = vertices[tail]
            .outbound
            .iter()
            .position(|edge| edge.peer == head)
            .ok_or(RoutingError::UnknownEdge { tail, head })?;
        let cost = vertices[tail].outbound.remove(position).cost;
        vertices[head].inbound.retain(|edge| edge.peer != tail);
        debug!("edge {} -> {} removed (cost {})", tail, head, cost);

        if self.carried_shortest_path(tail, head, cost) {
            self.repair(head);
        }
        Ok(cost)
    }

    /// Changes the cost of an existing edge, returning the previous cost
    ///
    /// # Errors
    /// Returns [`RoutingError::UnknownEdge`] if no such edge exists, or a
    /// validation error for a zero cost.
    pub fn set_edge_cost(
        &mut self,
        tail: VertexId,
        head: VertexId,
        cost: Cost,
    ) -> Result<Cost, RoutingError> {
        self.validate_edge(tail, head, cost)?;

        let vertices = &mut self.vertices.0;
        let outbound = vertices[tail]
            .outbound
            .iter_mut()
            .find(|edge| edge.peer == head)
            .ok_or(RoutingError::UnknownEdge { tail, head })?;
        let old = std::mem::replace(&mut outbound.cost, cost);
        if let Some(inbound) = vertices[head].inbound.iter_mut().find(|edge| edge.peer == tail) {
            inbound.cost = cost;
        }
        debug!("edge {} -> {} re-costed {} -> {}", tail, head, old, cost);

        match cost.cmp(&old) {
            Ordering::Less => self.improve_through(tail, head, cost),
            Ordering::Greater if self.carried_shortest_path(tail, head, old) => self.repair(head),
            _ => {}
        }
        Ok(old)
    }

    /// Vertices whose distance is no longer supported once `head` loses an
    /// in-edge
    ///
    /// A vertex is affected when none of its shortest-path in-edges comes
    /// from an unaffected vertex. Marking starts at `head` and follows
    /// shortest-path out-edges. Distances are read, not changed.
    pub fn mark_affected(&self, head: VertexId) -> Vec<VertexId> {
        self.affected_region(head).0
    }

    /// Seeds the frontier with a distance estimate for each affected vertex
    ///
    /// Each affected vertex takes the best distance offered by its
    /// unaffected in-neighbours. Vertices with a finite estimate are queued;
    /// the rest stay unreachable until the frontier reaches them.
    fn estimate_new_distances(&mut self, affected: &[VertexId]) {
        let affected_set: FxHashSet<VertexId> = affected.iter().copied().collect();
        for &v in affected {
            let vertex = &mut self.vertices.0[v];
            vertex.distance = Distance::Unreachable;
            vertex.predecessor = None;
        }

        for &v in affected {
            let best = self.vertices.0[v]
                .inbound
                .iter()
                .filter(|edge| !affected_set.contains(&edge.peer))
                .map(|edge| (self.vertices.0[edge.peer].distance.plus(edge.cost), edge.peer))
                .min();

            if let Some((distance, via)) = best.filter(|(d, _)| d.is_reachable()) {
                let vertex = &mut self.vertices.0[v];
                vertex.distance = distance;
                vertex.predecessor = Some(via);
                self.enqueue(v);
            }
        }
    }

    fn check_vertex(&self, v: VertexId) -> Result<(), RoutingError> {
        if v < self.vertex_count() {
            Ok(())
        } else {
            Err(RoutingError::UnknownVertex(v))
        }
    }

    fn validate_edge(
        &self,
        tail: VertexId,
        head: VertexId,
        cost: Cost,
    ) -> Result<(), RoutingError> {
        self.check_vertex(tail)?;
        self.check_vertex(head)?;
        if tail == head {
            return Err(RoutingError::SelfLoop(tail));
        }
        if cost == 0 {
            return Err(RoutingError::ZeroCost { tail, head });
        }
        Ok(())
    }

    /// Whether `tail -> head` at `cost` realised the head's distance
    fn carried_shortest_path(&self, tail: VertexId, head: VertexId, cost: Cost) -> bool {
        let head_distance = self.vertices.0[head].distance;
        head_distance.is_reachable() && self.vertices.0[tail].distance.plus(cost) == head_distance
    }

    /// Affected vertices, plus the unaffected vertices next to them whose
    /// predecessor may need repointing
    fn affected_region(&self, head: VertexId) -> (Vec<VertexId>, Vec<VertexId>) {
        let mut affected = FxHashSet::default();
        let mut order = Vec::new();
        let mut boundary = Vec::new();
        if head >= self.vertex_count()
            || head == self.source
            || !self.vertices.0[head].distance.is_reachable()
        {
            return (order, boundary);
        }
        if self.is_supported(head, &affected) {
            boundary.push(head);
            return (order, boundary);
        }

        affected.insert(head);
        order.push(head);
        let mut pending = vec![head];

        while let Some(v) = pending.pop() {
            let base = self.vertices.0[v].distance;
            for edge in self.vertices.0[v].outbound.iter() {
                let w = edge.peer;
                if w == self.source
                    || affected.contains(&w)
                    || base.plus(edge.cost) != self.vertices.0[w].distance
                {
                    continue;
                }
                if self.is_supported(w, &affected) {
                    boundary.push(w);
                } else {
                    affected.insert(w);
                    order.push(w);
                    pending.push(w);
                }
            }
        }

        boundary.retain(|v| !affected.contains(v));
        (order, boundary)
    }

    fn is_supported(&self, v: VertexId, affected: &FxHashSet<VertexId>) -> bool {
        let distance = self.vertices.0[v].distance;
        self.vertices.0[v].inbound.iter().any(|edge| {
            !affected.contains(&edge.peer)
                && self.vertices.0[edge.peer].distance.plus(edge.cost) == distance
        })
    }

    fn improve_through(&mut self, tail: VertexId, head: VertexId, cost: Cost) {
        let candidate = self.vertices.0[tail].distance.plus(cost);
        if self.relax(tail, head, candidate) {
            self.propagate();
        }
    }

    fn repair(&mut self, head: VertexId) {
        let (affected, boundary) = self.affected_region(head);
        debug!("{} vertices affected below vertex {}", affected.len(), head);
        if !affected.is_empty() {
            self.estimate_new_distances(&affected);
            self.propagate();
        }
        for v in boundary {
            self.repoint_predecessor(v);
        }
    }

    /// Points `v` at an in-neighbour that still realises its distance
    fn repoint_predecessor(&mut self, v: VertexId) {
        let distance = self.vertices.0[v].distance;
        let realises =
            |tail: VertexId, cost: Cost| self.vertices.0[tail].distance.plus(cost) == distance;

        let vertex = &self.vertices.0[v];
        let current = vertex.predecessor.and_then(|p| {
            vertex.inbound.iter().find(|edge| edge.peer == p && realises(p, edge.cost))
        });
        if current.is_some() {
            return;
        }
        let support = vertex
            .inbound
            .iter()
            .find(|edge| realises(edge.peer, edge.cost))
            .map(|edge| edge.peer);
        self.vertices.0[v].predecessor = support;
    }

    /// Lowers `head` to `candidate` via `tail` if that is an improvement
    fn relax(&mut self, tail: VertexId, head: VertexId, candidate: Distance) -> bool {
        let vertex = &mut self.vertices.0[head];
        if candidate >= vertex.distance {
            return false;
        }
        vertex.distance = candidate;
        vertex.predecessor = Some(tail);
        self.enqueue(head);
        true
    }

    /// Queues `v` or restores its frontier position after its distance fell
    fn enqueue(&mut self, v: VertexId) {
        // The frontier is the only heap over `vertices`, so membership picks
        // the one call that cannot fail.
        let queued = if self.frontier.is_linked(&self.vertices, v) {
            self.frontier.decrease_key(&mut self.vertices, v)
        } else {
            self.frontier.insert(&mut self.vertices, v)
        };
        debug_assert!(queued.is_ok());
    }

    /// Settles the frontier in distance order
    fn propagate(&mut self) {
        while let Some(u) = self.frontier.extract_min(&mut self.vertices) {
            let base = self.vertices.0[u].distance;
            trace!("settled vertex {} at distance {}", u, base);

            for i in 0..self.vertices.0[u].outbound.len() {
                let Edge { peer, cost } = self.vertices.0[u].outbound[i];
                self.relax(u, peer, base.plus(cost));
            }
        }
    }
}

/// Fluent construction of a [`Topology`]
///
/// Edges are collected first and the shortest-path tree is computed once in
/// [`build`](Self::build). A repeated edge keeps the last cost given.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    vertex_count: usize,
    source: VertexId,
    edges: Vec<(VertexId, VertexId, Cost)>,
}

impl TopologyBuilder {
    /// Starts a topology of `vertex_count` vertices rooted at vertex 0
    pub fn new(vertex_count: usize) -> Self {
        TopologyBuilder {
            vertex_count,
            source: 0,
            edges: Vec::new(),
        }
    }

    /// Sets the source vertex
    pub fn source(mut self, source: VertexId) -> Self {
        self.source = source;
        self
    }

    /// Adds the edge `tail -> head`
    pub fn edge(mut self, tail: VertexId, head: VertexId, cost: Cost) -> Self {
        self.edges.push((tail, head, cost));
        self
    }

    /// Adds every edge of `edges`
    pub fn edges<I>(mut self, edges: I) -> Self
    where
        I: IntoIterator<Item = (VertexId, VertexId, Cost)>,
    {
        self.edges.extend(edges);
        self
    }

    /// Validates the edges and computes the initial shortest-path tree
    ///
    /// # Errors
    /// Returns the first validation error encountered.
    pub fn build(self) -> Result<Topology, RoutingError> {
        let mut topology = Topology::new(self.vertex_count, self.source)?;

        for (tail, head, cost) in self.edges {
            topology.validate_edge(tail, head, cost)?;
            let vertices = &mut topology.vertices.0;
            match vertices[tail].outbound.iter_mut().find(|e| e.peer == head) {
                Some(edge) => {
                    edge.cost = cost;
                    if let Some(edge) = vertices[head].inbound.iter_mut().find(|e| e.peer == tail) {
                        edge.cost = cost;
                    }
                }
                None => {
                    vertices[tail].outbound.push(Edge { peer: head, cost });
                    vertices[head].inbound.push(Edge { peer: tail, cost });
                }
            }
        }

        topology.recalculate_shortest_paths();
        Ok(topology)
    }
}
