//! Render graph definition, compilation, and execution

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt::Write as _;

use thiserror::Error;

use crate::backend::traits::{DeviceError, RenderDevice};
use crate::render_graph::pass::{PassContext, RenderPass};
use crate::render_graph::resource::{
    PhysicalResource, ResourceDescriptor, ResourceHandle, ResourceInfo, ResourceKind,
    ResourceLifetime,
};

/// Errors produced while building, compiling, or executing a render graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The pass dependencies form a cycle. Carries the names of the passes
    /// the scheduler could not order.
    #[error("cyclic dependency between passes: {0:?}")]
    CyclicDependency(Vec<String>),
    /// A pass with this name already exists.
    #[error("duplicate pass name {0:?}")]
    DuplicatePass(String),
    /// A resource with this name is already declared.
    #[error("duplicate resource name {0:?}")]
    DuplicateResource(String),
    /// A pass references a name that is neither declared nor externally bound.
    #[error("pass {pass:?} references undeclared resource {resource:?}")]
    UnknownResource { pass: String, resource: String },
    /// The device failed to allocate a resource during compilation.
    #[error("failed to allocate resource {resource:?}")]
    Allocation {
        resource: String,
        #[source]
        source: DeviceError,
    },
    /// A pass callback returned an error during execution.
    #[error("pass {pass:?} failed")]
    PassFailed {
        pass: String,
        #[source]
        source: DeviceError,
    },
}

/// Summary counters for a graph, for logging and tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub total_passes: usize,
    /// Passes that survive culling and will run on `execute`.
    pub executed_passes: usize,
    pub culled_passes: usize,
    pub total_resources: usize,
    pub transient_resources: usize,
    /// Bytes of backing memory the graph owns (or would allocate, before
    /// compilation), computed from per-format pixel sizes. External
    /// resources are excluded; alias groups count once.
    pub estimated_memory: u64,
}

/// The render graph owns named resources and passes, compiles a valid
/// execution order, culls unreferenced passes, and manages backing
/// allocations.
///
/// The graph is an explicitly constructed value; whoever drives the frame
/// owns it and the device it allocates from. Mutations invalidate a previous
/// compilation, and [`execute`](RenderGraph::execute) recompiles on demand.
#[derive(Debug, Default)]
pub struct RenderGraph {
    passes: Vec<RenderPass>,
    pass_lookup: HashMap<String, usize>,
    resources: HashMap<String, ResourceDescriptor>,
    physical: HashMap<String, PhysicalResource>,
    /// Logical name -> logical name whose allocation backs it. Always points
    /// at an alias root, so lookups follow at most one link.
    aliases: HashMap<String, String>,
    /// Pass indices in scheduled order.
    execution_order: Vec<usize>,
    compiled: bool,
}

impl RenderGraph {
    /// Create a new empty render graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a new pass, returning a mutable reference for the
    /// caller to populate with inputs, outputs, and a callback.
    ///
    /// Duplicate names are rejected; silently replacing a pass would rewire
    /// every consumer of its outputs.
    pub fn add_pass(&mut self, name: impl Into<String>) -> Result<&mut RenderPass, GraphError> {
        let name = name.into();
        if self.pass_lookup.contains_key(&name) {
            return Err(GraphError::DuplicatePass(name));
        }
        self.compiled = false;
        let index = self.passes.len();
        self.pass_lookup.insert(name.clone(), index);
        self.passes.push(RenderPass::new(name));
        Ok(&mut self.passes[index])
    }

    /// Register a logical resource. Duplicate names are rejected.
    pub fn declare_resource(&mut self, descriptor: ResourceDescriptor) -> Result<(), GraphError> {
        if self.resources.contains_key(descriptor.name()) {
            return Err(GraphError::DuplicateResource(descriptor.name().to_string()));
        }
        self.compiled = false;
        self.resources
            .insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    /// Bind a name directly to a pre-existing handle (e.g. a swap-chain
    /// image). External resources are never allocated or freed by the graph.
    pub fn set_external_resource(&mut self, name: impl Into<String>, handle: ResourceHandle) {
        let name = name.into();
        let kind = match self.resources.get(&name) {
            Some(descriptor) => descriptor.kind(),
            None => match handle {
                ResourceHandle::Texture(_) => ResourceKind::Texture,
                ResourceHandle::Buffer(_) => ResourceKind::Buffer,
            },
        };
        self.physical.insert(
            name,
            PhysicalResource {
                handle,
                kind,
                allocated: true,
                external: true,
            },
        );
    }

    /// Resolve a logical name to its backing handle, following one alias
    /// indirection. Returns `None` for unresolved names (e.g. queried before
    /// [`compile`](RenderGraph::compile)).
    pub fn get_physical_resource(&self, name: &str) -> Option<ResourceHandle> {
        if let Some(physical) = self.physical.get(name) {
            return Some(physical.handle());
        }
        let target = self.aliases.get(name)?;
        self.physical.get(target).map(|physical| physical.handle())
    }

    /// Get a pass by name.
    pub fn pass(&self, name: &str) -> Option<&RenderPass> {
        self.pass_lookup.get(name).map(|&index| &self.passes[index])
    }

    /// Get a pass by name for further population.
    pub fn pass_mut(&mut self, name: &str) -> Option<&mut RenderPass> {
        let index = *self.pass_lookup.get(name)?;
        Some(&mut self.passes[index])
    }

    /// All passes in declaration order.
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    /// Get a declared resource descriptor by name.
    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(name)
    }

    /// True if the graph has been compiled and not mutated since.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Pass names in scheduled order. Empty before compilation.
    pub fn execution_order(&self) -> Vec<&str> {
        self.execution_order
            .iter()
            .map(|&index| self.passes[index].name())
            .collect()
    }

    /// Compile the graph for execution.
    ///
    /// Phases, each consuming the previous one's output:
    /// 1. validate that every reference resolves to a declared or external
    ///    resource
    /// 2. derive writer->reader dependencies and topologically sort the
    ///    passes (cycles are a hard error)
    /// 3. cull passes that no externally visible output depends on
    /// 4. compute resource lifetimes and plan transient aliasing
    /// 5. allocate backing resources for what remains
    pub fn compile(&mut self, device: &mut dyn RenderDevice) -> Result<(), GraphError> {
        for pass in &mut self.passes {
            pass.reset_schedule();
        }
        self.aliases.clear();
        self.execution_order.clear();

        self.validate_references()?;
        let dependencies = self.sort_passes()?;
        self.cull_passes(&dependencies);
        let lifetimes = self.resource_lifetimes();
        self.plan_aliases(&lifetimes);
        self.allocate_resources(device, &lifetimes)?;

        self.compiled = true;
        log::debug!(
            "compiled graph: {} passes ({} culled), {} resources, {} aliased",
            self.passes.len(),
            self.passes.iter().filter(|p| p.is_culled()).count(),
            self.resources.len(),
            self.aliases.len(),
        );
        Ok(())
    }

    /// Execute all non-culled passes strictly in the compiled order,
    /// compiling first if needed.
    ///
    /// A pass without a callback is a no-op. A callback error aborts
    /// execution and propagates to the caller; there is no per-pass recovery.
    pub fn execute(&mut self, device: &mut dyn RenderDevice) -> Result<(), GraphError> {
        if !self.compiled {
            self.compile(device)?;
        }

        let Self {
            passes,
            physical,
            aliases,
            execution_order,
            ..
        } = self;

        for &index in execution_order.iter() {
            let pass = &mut passes[index];
            if pass.is_culled() {
                log::trace!("skipping culled pass {:?}", pass.name());
                continue;
            }
            let name = pass.name().to_string();
            log::trace!("executing pass {:?}", name);
            let mut ctx = PassContext {
                device: &mut *device,
                physical,
                aliases,
                pass_name: &name,
            };
            pass.execute(&mut ctx)
                .map_err(|source| GraphError::PassFailed { pass: name, source })?;
        }
        Ok(())
    }

    /// Release every owned backing resource and reset the graph to empty.
    ///
    /// Deletion is keyed by kind: textures and render targets go through
    /// `destroy_texture`, buffers through `destroy_buffer`. External
    /// resources are dropped from the tables without being freed.
    pub fn clear(&mut self, device: &mut dyn RenderDevice) {
        for (name, physical) in self.physical.drain() {
            if physical.is_external() {
                continue;
            }
            log::trace!("releasing resource {:?}", name);
            match physical.handle() {
                ResourceHandle::Texture(handle) => device.destroy_texture(handle),
                ResourceHandle::Buffer(handle) => device.destroy_buffer(handle),
            }
        }
        self.passes.clear();
        self.pass_lookup.clear();
        self.resources.clear();
        self.aliases.clear();
        self.execution_order.clear();
        self.compiled = false;
    }

    /// Summary counters for logging and tooling.
    pub fn stats(&self) -> GraphStats {
        let culled_passes = self.passes.iter().filter(|p| p.is_culled()).count();
        let estimated_memory = self
            .resources
            .iter()
            .filter_map(|(name, descriptor)| match self.physical.get(name) {
                Some(physical) if physical.is_external() => None,
                Some(_) => Some(descriptor.estimated_size()),
                // Before compilation, estimate everything that would need
                // backing; afterwards, unallocated means culled or aliased.
                None if !self.compiled => Some(descriptor.estimated_size()),
                None => None,
            })
            .sum();

        GraphStats {
            total_passes: self.passes.len(),
            executed_passes: self.passes.len() - culled_passes,
            culled_passes,
            total_resources: self.resources.len(),
            transient_resources: self
                .resources
                .values()
                .filter(|r| r.is_transient())
                .count(),
            estimated_memory,
        }
    }

    /// Produce a Graphviz description of the graph: box nodes for passes
    /// (colored by culled state), ellipse nodes for resources, and edges for
    /// every read and write. Output is deterministic.
    pub fn export_dot(&self) -> String {
        let mut out = String::from("digraph render_graph {\n");
        out.push_str("    rankdir=LR;\n");

        for pass in &self.passes {
            let color = if pass.is_culled() {
                "gray80"
            } else {
                "palegreen"
            };
            let _ = writeln!(
                out,
                "    \"pass_{name}\" [label=\"{name}\", shape=box, style=filled, fillcolor={color}];",
                name = pass.name(),
                color = color,
            );
        }

        let mut resource_names: BTreeSet<&str> = self.resources.keys().map(String::as_str).collect();
        resource_names.extend(self.physical.keys().map(String::as_str));
        for pass in &self.passes {
            resource_names.extend(pass.inputs().iter().map(|r| r.resource.as_str()));
            resource_names.extend(pass.outputs().iter().map(|r| r.resource.as_str()));
        }

        for name in &resource_names {
            let external = self
                .physical
                .get(*name)
                .is_some_and(PhysicalResource::is_external);
            let transient = self
                .resources
                .get(*name)
                .is_some_and(ResourceDescriptor::is_transient);
            let style = if transient { "dashed" } else { "solid" };
            let color = if external { "lightgoldenrod" } else { "lightblue" };
            let _ = writeln!(
                out,
                "    \"res_{name}\" [label=\"{name}\", shape=ellipse, style=\"filled,{style}\", fillcolor={color}];",
                name = name,
                style = style,
                color = color,
            );
        }

        for pass in &self.passes {
            for input in pass.inputs() {
                let _ = writeln!(
                    out,
                    "    \"res_{}\" -> \"pass_{}\";",
                    input.resource,
                    pass.name()
                );
            }
            for output in pass.outputs() {
                let _ = writeln!(
                    out,
                    "    \"pass_{}\" -> \"res_{}\";",
                    pass.name(),
                    output.resource
                );
            }
        }

        out.push_str("}\n");
        out
    }

    fn validate_references(&self) -> Result<(), GraphError> {
        for pass in &self.passes {
            for reference in pass.inputs().iter().chain(pass.outputs()) {
                if !self.resources.contains_key(&reference.resource)
                    && !self.physical.contains_key(&reference.resource)
                {
                    return Err(GraphError::UnknownResource {
                        pass: pass.name().to_string(),
                        resource: reference.resource.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Derive dependencies and assign execution order via Kahn's algorithm.
    ///
    /// Every writer of a pass's input resource becomes a predecessor of that
    /// pass. Writers that also read the resource they write (read-modify-
    /// write, e.g. a composite pass writing back into the scene color it
    /// sampled) consume an existing version rather than producing the one
    /// other readers see, so they constrain nobody; without that exception
    /// every in-place pass would report a false cycle.
    ///
    /// Duplicate references produce duplicate edges; Kahn's algorithm
    /// tolerates them, so they are not collapsed.
    ///
    /// Returns the reader -> input-writers adjacency used by culling.
    fn sort_passes(&mut self) -> Result<Vec<Vec<usize>>, GraphError> {
        let n = self.passes.len();
        let mut writers: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, pass) in self.passes.iter().enumerate() {
            for output in pass.outputs() {
                if pass.reads_resource(&output.resource) {
                    continue;
                }
                writers.entry(output.resource.as_str()).or_default().push(index);
            }
        }

        let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0u32; n];
        let mut input_writers: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (reader, pass) in self.passes.iter().enumerate() {
            for input in pass.inputs() {
                let Some(resource_writers) = writers.get(input.resource.as_str()) else {
                    continue;
                };
                for &writer in resource_writers {
                    if writer != reader {
                        out_edges[writer].push(reader);
                        in_degree[reader] += 1;
                        input_writers[reader].push(writer);
                    }
                }
            }
        }

        // Kahn's algorithm: repeatedly take passes with no unsatisfied
        // dependencies, in declaration order for determinism.
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            for &next in &out_edges[index] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != n {
            let unresolved = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.passes[i].name().to_string())
                .collect();
            return Err(GraphError::CyclicDependency(unresolved));
        }

        for (position, &index) in order.iter().enumerate() {
            self.passes[index].set_execution_order(position);
        }
        self.execution_order = order;
        Ok(input_writers)
    }

    /// Mark every pass culled, then clear the flag on passes reachable from
    /// a required output: a breadth-first walk seeded with passes whose
    /// outputs are bound to physical (external) resources, following
    /// write-dependencies backwards.
    fn cull_passes(&mut self, input_writers: &[Vec<usize>]) {
        for pass in &mut self.passes {
            pass.set_culled(true);
        }

        let mut queue: VecDeque<usize> = VecDeque::new();
        for (index, pass) in self.passes.iter().enumerate() {
            let required = pass
                .outputs()
                .iter()
                .any(|output| self.physical.contains_key(&output.resource));
            if required {
                queue.push_back(index);
            }
        }

        while let Some(index) = queue.pop_front() {
            if !self.passes[index].is_culled() {
                continue;
            }
            self.passes[index].set_culled(false);
            for &writer in &input_writers[index] {
                if self.passes[writer].is_culled() {
                    queue.push_back(writer);
                }
            }
        }
    }

    /// First/last execution step of every resource touched by a non-culled
    /// pass.
    fn resource_lifetimes(&self) -> HashMap<String, ResourceLifetime> {
        let mut lifetimes: HashMap<String, ResourceLifetime> = HashMap::new();
        for (step, &index) in self.execution_order.iter().enumerate() {
            let pass = &self.passes[index];
            if pass.is_culled() {
                continue;
            }
            for reference in pass.inputs().iter().chain(pass.outputs()) {
                lifetimes
                    .entry(reference.resource.clone())
                    .and_modify(|lifetime| lifetime.touch(step))
                    .or_insert_with(|| ResourceLifetime::new(step));
            }
        }
        lifetimes
    }

    /// Let transient resources with interchangeable descriptors and
    /// non-overlapping lifetimes share one allocation. Greedy first-fit over
    /// resources ordered by first use; the alias map always points at the
    /// root that will own the allocation.
    fn plan_aliases(&mut self, lifetimes: &HashMap<String, ResourceLifetime>) {
        struct AliasRoot {
            name: String,
            info: ResourceInfo,
            lifetime: ResourceLifetime,
        }

        let mut candidates: Vec<(&ResourceDescriptor, ResourceLifetime)> = self
            .resources
            .values()
            .filter(|descriptor| descriptor.is_transient())
            .filter(|descriptor| {
                // Externally bound names are not the graph's to alias.
                self.physical
                    .get(descriptor.name())
                    .map_or(true, |physical| !physical.is_external())
            })
            .filter_map(|descriptor| {
                lifetimes
                    .get(descriptor.name())
                    .map(|&lifetime| (descriptor, lifetime))
            })
            .collect();
        candidates.sort_by(|a, b| {
            (a.1.first_use, a.1.last_use, a.0.name()).cmp(&(b.1.first_use, b.1.last_use, b.0.name()))
        });

        let mut roots: Vec<AliasRoot> = Vec::new();
        for (descriptor, lifetime) in candidates {
            // Resources that already carry an allocation from a previous
            // compile can only serve as roots.
            let backed = self.physical.contains_key(descriptor.name());
            let found = if backed {
                None
            } else {
                roots.iter_mut().find(|root| {
                    root.info.compatible(descriptor.info()) && !root.lifetime.overlaps(&lifetime)
                })
            };
            match found {
                Some(root) => {
                    log::trace!(
                        "aliasing resource {:?} onto {:?}",
                        descriptor.name(),
                        root.name
                    );
                    root.lifetime.merge(&lifetime);
                    self.aliases
                        .insert(descriptor.name().to_string(), root.name.clone());
                }
                None => roots.push(AliasRoot {
                    name: descriptor.name().to_string(),
                    info: descriptor.info().clone(),
                    lifetime,
                }),
            }
        }
    }

    /// Allocate backing resources for every declared resource that survives
    /// culling and aliasing. Already-backed and external names are skipped;
    /// allocation order across resources is unspecified.
    fn allocate_resources(
        &mut self,
        device: &mut dyn RenderDevice,
        lifetimes: &HashMap<String, ResourceLifetime>,
    ) -> Result<(), GraphError> {
        let Self {
            resources,
            physical,
            aliases,
            ..
        } = self;

        for (name, descriptor) in resources.iter() {
            if physical.contains_key(name) || aliases.contains_key(name) {
                continue;
            }
            if !lifetimes.contains_key(name) {
                log::trace!("resource {:?} unused after culling, not allocated", name);
                continue;
            }

            let handle = match descriptor.info() {
                ResourceInfo::Texture(desc) => device
                    .create_texture(desc)
                    .map(ResourceHandle::Texture)
                    .map_err(|source| GraphError::Allocation {
                        resource: name.clone(),
                        source,
                    })?,
                ResourceInfo::Buffer(desc) => device
                    .create_buffer(desc)
                    .map(ResourceHandle::Buffer)
                    .map_err(|source| GraphError::Allocation {
                        resource: name.clone(),
                        source,
                    })?,
            };
            physical.insert(
                name.clone(),
                PhysicalResource {
                    handle,
                    kind: descriptor.kind(),
                    allocated: true,
                    external: false,
                },
            );
        }
        Ok(())
    }
}
