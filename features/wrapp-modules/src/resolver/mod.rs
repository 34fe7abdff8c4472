//! Scope aware instantiation of providers from a compiled graph

use std::{any::type_name, fmt::Debug, sync::Arc};

use futures::{
    future::{try_join_all, BoxFuture},
    stream::FuturesUnordered,
    FutureExt, StreamExt,
};

use crate::{
    declarations::Provider,
    errors::{InitError, ResolveError},
    graph::{
        edge::{DependencyKey, Edge, InjectionKind},
        node::{Node, ProviderKind, ProviderNode},
        DependencyGraph,
    },
    types::{DynError, Injectable, Instance, Scope, Token},
};

pub mod arguments;
pub(crate) mod cache;

use arguments::Arguments;
use cache::{Claim, InstanceCache, ResolveResult};

/// Resolves instances from a [DependencyGraph]
///
/// Cheap to clone, clones share the graph and the singleton cache.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverInner>);
struct ResolverInner {
    graph: Arc<DependencyGraph>,
    singletons: InstanceCache,
}

/// Cache of one top level resolution, holds its request scoped instances
#[derive(Clone, Default)]
struct RequestContext(Arc<InstanceCache>);

impl Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("Resolver");
        for provider in self.graph().providers() {
            let val = match self.0.singletons.get(&provider.id) {
                Some(_) => "ready",
                None => "not constructed",
            };
            map.field(&provider.label, &val);
        }
        map.finish()
    }
}

impl Resolver {
    pub fn new(graph: impl Into<Arc<DependencyGraph>>) -> Self {
        Resolver(Arc::new(ResolverInner {
            graph: graph.into(),
            singletons: InstanceCache::default(),
        }))
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.0.graph
    }

    /// Resolves the provider registered under the type token of `T`
    pub async fn resolve<T: Injectable>(&self) -> Result<Arc<T>, ResolveError> {
        self.resolve_provider(Token::of::<T>()).await
    }

    /// Resolves the provider of `token` and downcasts it to `T`
    pub async fn resolve_provider<T: Injectable>(
        &self,
        token: impl Into<Token>,
    ) -> Result<Arc<T>, ResolveError> {
        let token = token.into();
        let instance = self.resolve_instance(token.clone()).await?;
        instance
            .downcast::<T>()
            .map_err(|actual_type| ResolveError::DowncastFailed {
                token,
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Resolves the provider of `token` as a top level resolution
    ///
    /// Request scoped providers are shared within this call only.
    pub async fn resolve_instance(
        &self,
        token: impl Into<Token>,
    ) -> Result<Instance, ResolveError> {
        self.resolve_in(token.into(), RequestContext::default()).await
    }

    /// Eagerly constructs every singleton provider
    ///
    /// Fails without constructing anything if the graph has errors.
    pub async fn init(&self) -> Result<(), InitError> {
        self.graph().check()?;

        let context = RequestContext::default();
        let mut pending = self
            .graph()
            .providers()
            .filter(|provider| {
                provider.scope == Scope::Singleton || provider.kind == ProviderKind::UseValue
            })
            .map(|provider| self.resolve_in(provider.id.clone(), context.clone()))
            .collect::<FuturesUnordered<_>>();

        let total = pending.len();
        let mut complete = 0;
        while let Some(result) = pending.next().await {
            result?;
            complete += 1;
            tracing::debug!("Waiting for providers to finish [{complete} of {total} complete]");
        }

        let (ready, pending) = self.0.singletons.stats();
        tracing::info!("Initiated {ready} singletons, {pending} still in flight");
        Ok(())
    }

    fn resolve_in(
        &self,
        token: Token,
        context: RequestContext,
    ) -> BoxFuture<'static, ResolveResult> {
        let this = self.clone();
        async move {
            let graph = this.0.graph.clone();
            let node = match graph.get_node(&token) {
                Some(Node::Provider(node)) => node,
                Some(Node::Module(_)) => return Err(ResolveError::NotAProvider(token)),
                None => {
                    tracing::error!("Tried to resolve an unregistered token: {token}");
                    return Err(ResolveError::ProviderNotFound(token));
                }
            };

            let cache = match (node.kind, node.scope) {
                (ProviderKind::UseValue, _) | (_, Scope::Singleton) => &this.0.singletons,
                (_, Scope::Request) => &*context.0,
                (_, Scope::Transient) => return this.instantiate(node, &context).await,
            };

            match cache.claim(&token) {
                Claim::Ready(instance) => Ok(instance),
                Claim::Wait(rx) => {
                    tracing::debug!("Waiting for in-flight construction of '{token}'");
                    rx.await.unwrap_or_else(|_| Err(ResolveError::Aborted(token.clone())))
                }
                Claim::Build(guard) => {
                    let result = this.instantiate(node, &context).await;
                    guard.publish(result)
                }
            }
        }
        .boxed()
    }

    async fn instantiate(&self, node: &ProviderNode, context: &RequestContext) -> ResolveResult {
        let token = &node.id;
        match &node.provider {
            Provider::UseValue { value, .. } => Ok(value.clone()),
            Provider::UseFactory { factory, .. } => {
                let args = self.constructor_arguments(token, context).await?;
                tracing::debug!("Invoking factory for '{token}'");
                (factory.factory)(args)
                    .await
                    .map_err(|error| construction_failed(token, error))
            }
            Provider::Class(class) | Provider::UseClass { class, .. } => {
                let args = self.constructor_arguments(token, context).await?;
                let mut instance = class
                    .class
                    .construct(args)
                    .await
                    .map_err(|error| construction_failed(token, error))?;

                // Properties are assigned one after another, in declaration order
                for edge in self.graph().get_edge(token) {
                    if !edge.is_active(InjectionKind::Property) {
                        continue;
                    }
                    let Some(DependencyKey::Property(key)) =
                        edge.as_dependency().map(|dependency| &dependency.key)
                    else {
                        continue;
                    };
                    if let Some(value) = self.resolve_dependency(edge, context).await? {
                        instance
                            .inject_property(key, value)
                            .map_err(|error| construction_failed(token, error))?;
                    }
                }

                instance
                    .on_module_init()
                    .await
                    .map_err(|error| construction_failed(token, error))?;

                let instance = instance.into_instance();
                tracing::debug!("Constructed instance of {}", instance.info.type_name);
                Ok(instance)
            }
        }
    }

    /// Resolves all active constructor dependencies concurrently, keeping their positions
    async fn constructor_arguments(
        &self,
        token: &Token,
        context: &RequestContext,
    ) -> Result<Arguments, ResolveError> {
        let edges = self
            .graph()
            .get_edge(token)
            .into_iter()
            .filter_map(|edge| match edge.as_dependency() {
                Some(dependency) if dependency.injection == InjectionKind::Constructor => {
                    match dependency.key {
                        DependencyKey::Index(index) => Some((index, edge)),
                        DependencyKey::Property(_) => None,
                    }
                }
                _ => None,
            })
            .collect::<Vec<_>>();

        let len = edges.iter().map(|(index, _)| index + 1).max().unwrap_or(0);
        let active = edges
            .into_iter()
            .filter(|(_, edge)| edge.is_active(InjectionKind::Constructor))
            .collect::<Vec<_>>();

        let resolved = try_join_all(
            active
                .iter()
                .map(|(_, edge)| self.resolve_dependency(edge, context)),
        )
        .await?;

        let mut slots = vec![None; len];
        for ((index, _), instance) in active.iter().zip(resolved) {
            slots[*index] = instance;
        }
        Ok(Arguments::new(slots))
    }

    /// An optional dependency without a provider resolves to nothing
    async fn resolve_dependency(
        &self,
        edge: &Edge,
        context: &RequestContext,
    ) -> Result<Option<Instance>, ResolveError> {
        let optional = edge.as_dependency().is_some_and(|dependency| dependency.optional);
        match self.resolve_in(edge.target.clone(), context.clone()).await {
            Ok(instance) => Ok(Some(instance)),
            Err(ResolveError::ProviderNotFound(missing)) if optional && missing == edge.target => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn construction_failed(token: &Token, error: DynError) -> ResolveError {
    ResolveError::ConstructionFailed {
        token: token.clone(),
        error: Arc::new(error),
    }
}
