//! Compilation Model
//!
//! Jobs own the units being compiled, the cross-reference counter and the constant pool. Units
//! own the create and update operation lists of one emitted function.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::PipelineOptions;
use crate::constant_pool::ConstantPool;
use crate::error::{PipelineError, Result};
use crate::output::output_ast::{Expression, Statement};
use crate::template::pipeline::ir::expression::{ExpressionTransform, VisitorContextFlag};
use crate::template::pipeline::ir::variable::AliasVariable;
use crate::template::pipeline::ir::{
    CompatibilityMode, ConstIndex, CreateOp, ListId, OpList, UpdateOp, XrefId,
};

/// The kind of compilation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationJobKind {
    /// Template compilation
    Tmpl,
    /// Host binding compilation
    Host,
    /// A special value used to indicate that some logic applies to both compilation types
    Both,
}

impl CompilationJobKind {
    /// Whether a phase registered for `self` runs on a job of kind `job`.
    pub fn applies_to(self, job: CompilationJobKind) -> bool {
        self == CompilationJobKind::Both || self == job
    }
}

/// Possible modes in which a component's template can be compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemplateCompilationMode {
    /// Supports the full instruction set, including directives.
    #[default]
    Full,
    /// Uses a narrower instruction set that doesn't support directives and allows optimizations.
    DomOnly,
}

/// State shared by every job kind.
#[derive(Debug)]
pub struct JobBase {
    pub component_name: String,
    pub pool: ConstantPool,
    pub compatibility: CompatibilityMode,
    pub mode: TemplateCompilationMode,
    pub i18n_use_external_ids: bool,
    pub enable_chaining: bool,
    pub max_chain_length: usize,
    next_xref_id: usize,
    next_list_id: usize,
}

impl JobBase {
    fn new(component_name: String, pool: ConstantPool, options: &PipelineOptions) -> Self {
        JobBase {
            component_name,
            pool,
            compatibility: options.compatibility,
            mode: options.mode,
            i18n_use_external_ids: options.i18n_use_external_ids,
            enable_chaining: options.enable_chaining,
            max_chain_length: options.max_chain_length,
            next_xref_id: 0,
            next_list_id: 0,
        }
    }

    /// Generate a new unique `XrefId` in this job.
    pub fn allocate_xref_id(&mut self) -> XrefId {
        let id = XrefId::new(self.next_xref_id);
        self.next_xref_id += 1;
        id
    }

    pub fn allocate_list_id(&mut self) -> ListId {
        let id = ListId(self.next_list_id);
        self.next_list_id += 1;
        id
    }

    /// A fresh, empty list owned by this job.
    pub fn new_op_list<T>(&mut self) -> OpList<T> {
        OpList::new(self.allocate_list_id())
    }

    pub fn is_compat(&self) -> bool {
        self.compatibility == CompatibilityMode::TemplateDefinitionBuilder
    }
}

/// An entire ongoing compilation, which will result in one or more template functions when
/// complete. Contains one or more corresponding compilation units.
pub trait CompilationJob: Send {
    fn base(&self) -> &JobBase;

    fn base_mut(&mut self) -> &mut JobBase;

    fn kind(&self) -> CompilationJobKind;

    /// Suffix of generated function names.
    fn fn_suffix(&self) -> &'static str;

    /// The xref of the root unit.
    fn root_xref(&self) -> XrefId;

    /// All units of this job, root first.
    fn units(&self) -> Vec<&dyn CompilationUnit>;

    /// The job state and all units, borrowed separately so phases can allocate ids or pool
    /// constants while rewriting units.
    fn parts_mut(&mut self) -> (&mut JobBase, Vec<&mut dyn CompilationUnit>);

    fn units_mut(&mut self) -> Vec<&mut dyn CompilationUnit> {
        self.parts_mut().1
    }

    fn allocate_xref_id(&mut self) -> XrefId {
        self.base_mut().allocate_xref_id()
    }

    fn as_component_mut(&mut self) -> Option<&mut ComponentCompilationJob> {
        None
    }

    fn as_host_mut(&mut self) -> Option<&mut HostBindingCompilationJob> {
        None
    }
}

/// A compilation unit is compiled into a template function. Some example units are views and
/// host bindings.
pub trait CompilationUnit: Send {
    fn xref(&self) -> XrefId;

    /// The enclosing view, for embedded views.
    fn parent(&self) -> Option<XrefId> {
        None
    }

    fn create(&self) -> &OpList<CreateOp>;

    fn create_mut(&mut self) -> &mut OpList<CreateOp>;

    fn update(&self) -> &OpList<UpdateOp>;

    fn update_mut(&mut self) -> &mut OpList<UpdateOp>;

    /// Both lists at once.
    fn lists_mut(&mut self) -> (&mut OpList<CreateOp>, &mut OpList<UpdateOp>);

    /// The name of the generated function, once named.
    fn fn_name(&self) -> Option<&str>;

    fn set_fn_name(&mut self, name: String);

    /// Number of variable slots used by this unit. Errors before variable counting ran.
    fn vars(&self) -> Result<usize>;

    fn set_vars(&mut self, vars: usize) -> Result<()>;
}

fn read_once(value: Option<usize>, what: &'static str) -> Result<usize> {
    value.ok_or(PipelineError::Unset { what })
}

fn write_once(slot: &mut Option<usize>, value: usize, what: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(PipelineError::Reassigned { what });
    }
    *slot = Some(value);
    Ok(())
}

/// Run `transform` over every expression in every op of `unit`, nested handler bodies included.
pub fn transform_unit_expressions(
    unit: &mut dyn CompilationUnit,
    transform: &mut ExpressionTransform<'_>,
) {
    let (create, update) = unit.lists_mut();
    for op in create.iter_mut() {
        op.transform_expressions(transform, VisitorContextFlag::NONE);
    }
    for op in update.iter_mut() {
        op.transform_expressions(transform, VisitorContextFlag::NONE);
    }
}

/// Compilation-in-progress of an individual view within a template.
#[derive(Debug)]
pub struct ViewCompilationUnit {
    pub xref: XrefId,
    pub parent: Option<XrefId>,
    pub create: OpList<CreateOp>,
    pub update: OpList<UpdateOp>,
    /// Map of declared variables available within this view to the property on the context
    /// object which they alias.
    pub context_variables: IndexMap<String, String>,
    /// Set of aliases available within this view. An alias is a variable whose provided
    /// expression is inlined at every location it is used.
    pub aliases: Vec<AliasVariable>,
    fn_name: Option<String>,
    vars: Option<usize>,
    decls: Option<usize>,
}

impl ViewCompilationUnit {
    fn new(base: &mut JobBase, xref: XrefId, parent: Option<XrefId>) -> Self {
        ViewCompilationUnit {
            xref,
            parent,
            create: base.new_op_list(),
            update: base.new_op_list(),
            context_variables: IndexMap::new(),
            aliases: Vec::new(),
            fn_name: None,
            vars: None,
            decls: None,
        }
    }

    /// Number of declaration slots used by this view. Errors before slot allocation ran.
    pub fn decls(&self) -> Result<usize> {
        read_once(self.decls, "decls")
    }

    pub fn set_decls(&mut self, decls: usize) -> Result<()> {
        write_once(&mut self.decls, decls, "decls")
    }
}

impl CompilationUnit for ViewCompilationUnit {
    fn xref(&self) -> XrefId {
        self.xref
    }

    fn parent(&self) -> Option<XrefId> {
        self.parent
    }

    fn create(&self) -> &OpList<CreateOp> {
        &self.create
    }

    fn create_mut(&mut self) -> &mut OpList<CreateOp> {
        &mut self.create
    }

    fn update(&self) -> &OpList<UpdateOp> {
        &self.update
    }

    fn update_mut(&mut self) -> &mut OpList<UpdateOp> {
        &mut self.update
    }

    fn lists_mut(&mut self) -> (&mut OpList<CreateOp>, &mut OpList<UpdateOp>) {
        (&mut self.create, &mut self.update)
    }

    fn fn_name(&self) -> Option<&str> {
        self.fn_name.as_deref()
    }

    fn set_fn_name(&mut self, name: String) {
        self.fn_name = Some(name);
    }

    fn vars(&self) -> Result<usize> {
        read_once(self.vars, "vars")
    }

    fn set_vars(&mut self, vars: usize) -> Result<()> {
        write_once(&mut self.vars, vars, "vars")
    }
}

/// Compilation-in-progress of a whole component's template, including the main template and any
/// embedded views.
#[derive(Debug)]
pub struct ComponentCompilationJob {
    pub base: JobBase,
    /// The root view's xref. The root view is also stored in `views`.
    pub root: XrefId,
    /// Map of view IDs to `ViewCompilationUnit`s, in creation order.
    pub views: IndexMap<XrefId, ViewCompilationUnit>,
    /// Parsed `ng-content` selectors, once generated.
    pub content_selectors: Option<Expression>,
    /// Constant expressions used by operations within this component's compilation.
    pub consts: Vec<Expression>,
    /// Initialization statements needed to set up the consts.
    pub consts_initializers: Vec<Statement>,
    /// Path of the compiled file, used to derive file-based i18n message names.
    pub relative_context_file_path: String,
}

impl ComponentCompilationJob {
    pub fn new(component_name: impl Into<String>, pool: ConstantPool, options: &PipelineOptions) -> Self {
        let mut base = JobBase::new(component_name.into(), pool, options);
        let root = base.allocate_xref_id();
        let root_view = ViewCompilationUnit::new(&mut base, root, None);
        let mut views = IndexMap::new();
        views.insert(root, root_view);
        ComponentCompilationJob {
            base,
            root,
            views,
            content_selectors: None,
            consts: Vec::new(),
            consts_initializers: Vec::new(),
            relative_context_file_path: String::new(),
        }
    }

    /// Add a `ViewCompilationUnit` for a new embedded view to this compilation.
    pub fn allocate_view(&mut self, parent: XrefId) -> Result<XrefId> {
        if !self.views.contains_key(&parent) {
            return Err(PipelineError::MissingView(parent));
        }
        let xref = self.base.allocate_xref_id();
        let view = ViewCompilationUnit::new(&mut self.base, xref, Some(parent));
        self.views.insert(xref, view);
        Ok(xref)
    }

    pub fn view(&self, xref: XrefId) -> Result<&ViewCompilationUnit> {
        self.views.get(&xref).ok_or(PipelineError::MissingView(xref))
    }

    pub fn view_mut(&mut self, xref: XrefId) -> Result<&mut ViewCompilationUnit> {
        self.views.get_mut(&xref).ok_or(PipelineError::MissingView(xref))
    }

    pub fn root_view(&self) -> Result<&ViewCompilationUnit> {
        self.view(self.root)
    }

    pub fn root_view_mut(&mut self) -> Result<&mut ViewCompilationUnit> {
        let root = self.root;
        self.view_mut(root)
    }

    /// Add a constant `Expression` to the compilation and return its index in the `consts`
    /// array. Equivalent constants share one index.
    pub fn add_const(&mut self, new_const: Expression, initializers: Vec<Statement>) -> ConstIndex {
        if let Some(idx) = self.consts.iter().position(|c| c.is_equivalent(&new_const)) {
            return ConstIndex::new(idx);
        }
        let idx = self.consts.len();
        self.consts.push(new_const);
        self.consts_initializers.extend(initializers);
        ConstIndex::new(idx)
    }
}

impl CompilationJob for ComponentCompilationJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    fn kind(&self) -> CompilationJobKind {
        CompilationJobKind::Tmpl
    }

    fn fn_suffix(&self) -> &'static str {
        "Template"
    }

    fn root_xref(&self) -> XrefId {
        self.root
    }

    fn units(&self) -> Vec<&dyn CompilationUnit> {
        self.views
            .values()
            .map(|v| v as &dyn CompilationUnit)
            .collect()
    }

    fn parts_mut(&mut self) -> (&mut JobBase, Vec<&mut dyn CompilationUnit>) {
        let units = self
            .views
            .values_mut()
            .map(|v| v as &mut dyn CompilationUnit)
            .collect();
        (&mut self.base, units)
    }

    fn as_component_mut(&mut self) -> Option<&mut ComponentCompilationJob> {
        Some(self)
    }
}

/// The single unit of a host binding compilation.
#[derive(Debug)]
pub struct HostBindingCompilationUnit {
    pub xref: XrefId,
    pub create: OpList<CreateOp>,
    pub update: OpList<UpdateOp>,
    /// Static host attributes, once collected.
    pub attributes: Option<Expression>,
    fn_name: Option<String>,
    vars: Option<usize>,
}

impl CompilationUnit for HostBindingCompilationUnit {
    fn xref(&self) -> XrefId {
        self.xref
    }

    fn create(&self) -> &OpList<CreateOp> {
        &self.create
    }

    fn create_mut(&mut self) -> &mut OpList<CreateOp> {
        &mut self.create
    }

    fn update(&self) -> &OpList<UpdateOp> {
        &self.update
    }

    fn update_mut(&mut self) -> &mut OpList<UpdateOp> {
        &mut self.update
    }

    fn lists_mut(&mut self) -> (&mut OpList<CreateOp>, &mut OpList<UpdateOp>) {
        (&mut self.create, &mut self.update)
    }

    fn fn_name(&self) -> Option<&str> {
        self.fn_name.as_deref()
    }

    fn set_fn_name(&mut self, name: String) {
        self.fn_name = Some(name);
    }

    fn vars(&self) -> Result<usize> {
        read_once(self.vars, "vars")
    }

    fn set_vars(&mut self, vars: usize) -> Result<()> {
        write_once(&mut self.vars, vars, "vars")
    }
}

/// Compilation-in-progress of a host binding, which contains a single unit for that host
/// binding.
#[derive(Debug)]
pub struct HostBindingCompilationJob {
    pub base: JobBase,
    pub root: HostBindingCompilationUnit,
}

impl HostBindingCompilationJob {
    pub fn new(component_name: impl Into<String>, pool: ConstantPool, options: &PipelineOptions) -> Self {
        let mut base = JobBase::new(component_name.into(), pool, options);
        // Host bindings only ever use the DOM instruction set.
        base.mode = TemplateCompilationMode::DomOnly;
        let xref = base.allocate_xref_id();
        let root = HostBindingCompilationUnit {
            xref,
            create: base.new_op_list(),
            update: base.new_op_list(),
            attributes: None,
            fn_name: None,
            vars: None,
        };
        HostBindingCompilationJob { base, root }
    }
}

impl CompilationJob for HostBindingCompilationJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    fn kind(&self) -> CompilationJobKind {
        CompilationJobKind::Host
    }

    fn fn_suffix(&self) -> &'static str {
        "HostBindings"
    }

    fn root_xref(&self) -> XrefId {
        self.root.xref
    }

    fn units(&self) -> Vec<&dyn CompilationUnit> {
        vec![&self.root]
    }

    fn parts_mut(&mut self) -> (&mut JobBase, Vec<&mut dyn CompilationUnit>) {
        (&mut self.base, vec![&mut self.root])
    }

    fn as_host_mut(&mut self) -> Option<&mut HostBindingCompilationJob> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::output_ast as o;

    fn job() -> ComponentCompilationJob {
        ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default())
    }

    #[test]
    fn test_xref_ids_strictly_increase() {
        let mut job = job();
        let a = job.allocate_xref_id();
        let b = job.allocate_xref_id();
        let view = job.allocate_view(job.root).unwrap();
        assert!(job.root < a && a < b && b < view);
    }

    #[test]
    fn test_add_const_dedups_equivalent_expressions() {
        let mut job = job();
        let a = job.add_const(o::literal_arr(vec![o::literal("id"), o::literal("x")]), vec![]);
        let b = job.add_const(o::literal_arr(vec![o::literal("id"), o::literal("x")]), vec![]);
        let c = job.add_const(o::literal_arr(vec![o::literal("id"), o::literal("y")]), vec![]);
        assert_eq!(a, b);
        assert_eq!(c, ConstIndex(1));
    }

    #[test]
    fn test_vars_and_decls_are_write_once() {
        let mut job = job();
        let root = job.root_view_mut().unwrap();
        assert_eq!(root.vars(), Err(PipelineError::Unset { what: "vars" }));
        root.set_vars(2).unwrap();
        assert_eq!(root.vars(), Ok(2));
        assert_eq!(root.set_vars(3), Err(PipelineError::Reassigned { what: "vars" }));
        assert!(root.decls().is_err());
    }

    #[test]
    fn test_allocate_view_requires_existing_parent() {
        let mut job = job();
        assert_eq!(
            job.allocate_view(XrefId(99)),
            Err(PipelineError::MissingView(XrefId(99)))
        );
    }

    #[test]
    fn test_host_job_is_dom_only() {
        let job = HostBindingCompilationJob::new("Dir", ConstantPool::new(), &PipelineOptions::default());
        assert_eq!(job.base.mode, TemplateCompilationMode::DomOnly);
        assert_eq!(job.units().len(), 1);
        assert_eq!(job.kind(), CompilationJobKind::Host);
    }
}
