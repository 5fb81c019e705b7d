//! Per-operation metadata: authentication policy and required scopes
//!
//! Operations are registered by id at start-up. Each carries an optional
//! authentication policy, any number of scope declarations, and may adopt
//! the declarations of an operation registered before it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use authx_core::{AuthnPolicy, RequestContext};
use tracing::debug;

use crate::error::{AuthxError, Result};
use crate::scope::{escape_segment, Scope};

/// Function computing scopes from the current request
pub type ScopeFn = Arc<dyn Fn(&RequestContext) -> Vec<String> + Send + Sync>;

/// One scope declaration: a fixed list, or a function of the request
#[derive(Clone)]
pub enum ScopeSpec {
    Static(Vec<String>),
    Dynamic(ScopeFn),
}

impl ScopeSpec {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Vec<String> + Send + Sync + 'static,
    {
        ScopeSpec::Dynamic(Arc::new(f))
    }

    /// A scope with `{name}` placeholders filled from path parameters.
    ///
    /// Parameter values are passed through [`escape_segment`], so a value
    /// always fills exactly one literal segment. A placeholder with no
    /// matching parameter is left in place, which makes the resulting scope
    /// invalid: the template names a parameter the route does not have.
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        if !template.contains('{') {
            return ScopeSpec::Static(vec![template]);
        }
        ScopeSpec::dynamic(move |request| vec![fill_template(&template, request)])
    }

    /// Raw scope strings for this request
    pub fn scopes_for(&self, request: &RequestContext) -> Vec<String> {
        match self {
            ScopeSpec::Static(scopes) => scopes.clone(),
            ScopeSpec::Dynamic(f) => f(request),
        }
    }
}

fn fill_template(template: &str, request: &RequestContext) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match request.param(name) {
                    Some(value) => filled.push_str(&escape_segment(value)),
                    None => {
                        filled.push('{');
                        filled.push_str(name);
                        filled.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                filled.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    filled.push_str(rest);
    filled
}

impl fmt::Debug for ScopeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSpec::Static(scopes) => f.debug_tuple("Static").field(scopes).finish(),
            ScopeSpec::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl From<&str> for ScopeSpec {
    fn from(scope: &str) -> Self {
        ScopeSpec::Static(vec![scope.to_string()])
    }
}

impl From<String> for ScopeSpec {
    fn from(scope: String) -> Self {
        ScopeSpec::Static(vec![scope])
    }
}

impl From<Vec<String>> for ScopeSpec {
    fn from(scopes: Vec<String>) -> Self {
        ScopeSpec::Static(scopes)
    }
}

impl From<&[&str]> for ScopeSpec {
    fn from(scopes: &[&str]) -> Self {
        ScopeSpec::Static(scopes.iter().map(|s| s.to_string()).collect())
    }
}

/// All scope declarations attached to one operation, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ScopeDeclaration {
    specs: Vec<ScopeSpec>,
}

impl ScopeDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration
    pub fn append(&mut self, spec: impl Into<ScopeSpec>) {
        self.specs.push(spec.into());
    }

    /// Append every declaration of `other`
    pub fn extend(&mut self, other: &ScopeDeclaration) {
        self.specs.extend(other.specs.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Flatten every declaration against `request` and parse the result
    pub fn resolve(&self, request: &RequestContext) -> Result<Vec<Scope>> {
        self.specs
            .iter()
            .flat_map(|spec| spec.scopes_for(request))
            .map(|raw| Scope::new(&raw).map_err(AuthxError::from))
            .collect()
    }
}

impl From<ScopeSpec> for ScopeDeclaration {
    fn from(spec: ScopeSpec) -> Self {
        Self { specs: vec![spec] }
    }
}

impl From<&str> for ScopeDeclaration {
    fn from(scope: &str) -> Self {
        ScopeSpec::from(scope).into()
    }
}

impl From<Vec<String>> for ScopeDeclaration {
    fn from(scopes: Vec<String>) -> Self {
        ScopeSpec::from(scopes).into()
    }
}

/// Identifies an operation as `group.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId {
    pub group: String,
    pub name: String,
}

impl OperationId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

impl FromStr for OperationId {
    type Err = AuthxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(group, name))
            }
            _ => Err(AuthxError::config(format!(
                "operation id '{}' must have the form group.operation",
                s
            ))),
        }
    }
}

/// Declarations for one operation
#[derive(Debug, Clone, Default)]
pub struct OperationMeta {
    pub authn: Option<AuthnPolicy>,
    pub scopes: ScopeDeclaration,
    pub adopt: Vec<OperationId>,
}

impl OperationMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authn(mut self, policy: AuthnPolicy) -> Self {
        self.authn = Some(policy);
        self
    }

    /// Append a scope declaration
    pub fn scope(mut self, spec: impl Into<ScopeSpec>) -> Self {
        self.scopes.append(spec);
        self
    }

    /// Append the declarations of an already registered operation
    pub fn adopt_from(mut self, operation: OperationId) -> Self {
        self.adopt.push(operation);
        self
    }
}

/// Declarations shared by every operation of a group
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupMeta {
    pub authn: Option<AuthnPolicy>,
}

/// Source of operation metadata consulted by the pipeline
pub trait OperationMetadata: Send + Sync {
    /// Effective authentication policy for the operation
    fn authn_policy(&self, operation: &OperationId) -> Result<AuthnPolicy>;

    /// Scope declarations, or `None` if the operation declares none
    fn scopes(&self, operation: &OperationId) -> Result<Option<&ScopeDeclaration>>;
}

/// In-memory [`OperationMetadata`] built at start-up
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<OperationId, OperationMeta>,
    groups: HashMap<String, GroupMeta>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation.
    ///
    /// Adopted operations must already be registered and must declare at
    /// least one scope; their declarations are appended after the
    /// operation's own.
    pub fn register(&mut self, operation: OperationId, mut meta: OperationMeta) -> Result<()> {
        if self.operations.contains_key(&operation) {
            return Err(AuthxError::config(format!(
                "operation '{}' is registered twice",
                operation
            )));
        }

        for adopted in &meta.adopt {
            let source = self
                .operations
                .get(adopted)
                .ok_or_else(|| AuthxError::UnknownOperation(adopted.to_string()))?;

            if source.scopes.is_empty() {
                return Err(AuthxError::AdoptedScopesMissing {
                    operation: operation.to_string(),
                    adopted: adopted.to_string(),
                });
            }
            meta.scopes.extend(&source.scopes);
        }

        debug!(
            operation = %operation,
            declarations = meta.scopes.len(),
            "Registered operation"
        );
        self.operations.insert(operation, meta);
        Ok(())
    }

    pub fn set_group_policy(&mut self, group: impl Into<String>, policy: AuthnPolicy) {
        self.groups.entry(group.into()).or_default().authn = Some(policy);
    }

    pub fn get(&self, operation: &OperationId) -> Option<&OperationMeta> {
        self.operations.get(operation)
    }

    pub fn contains(&self, operation: &OperationId) -> bool {
        self.operations.contains_key(operation)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn lookup(&self, operation: &OperationId) -> Result<&OperationMeta> {
        self.operations
            .get(operation)
            .ok_or_else(|| AuthxError::UnknownOperation(operation.to_string()))
    }
}

impl OperationMetadata for OperationRegistry {
    fn authn_policy(&self, operation: &OperationId) -> Result<AuthnPolicy> {
        let meta = self.lookup(operation)?;
        let group = self.groups.get(&operation.group).and_then(|g| g.authn);
        Ok(AuthnPolicy::resolve(meta.authn, group))
    }

    fn scopes(&self, operation: &OperationId) -> Result<Option<&ScopeDeclaration>> {
        let meta = self.lookup(operation)?;
        Ok((!meta.scopes.is_empty()).then_some(&meta.scopes))
    }
}
