// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Seeded per-API-group clients.
//!
//! Every API group gets its own [`ResourceClient`], backed by a kube-rs reflector
//! store seeded with that group's objects. Writes go through the store writer and are
//! published as [`WatchEvent`]s on a bundle-wide broadcast channel, which the
//! [`crate::watch::WatchFactory`] relays to controllers once delivery has started.
//!
//! The [`ClientBundle`] is built once per orchestrator and shared by reference with
//! every controller; [`KubeFacade`] is the combined view controllers use.

use crate::constants::WATCH_CHANNEL_CAPACITY;
use crate::crd::{
    AdminNetworkPolicy, AdminPolicyBasedExternalRoute, EgressFirewall, EgressIP, EgressIPStatus,
    EgressQoS, EgressService, MultiNetworkPolicy, NetworkAttachmentDefinition, ResourceList,
};
use crate::errors::ClientError;
use crate::objects::{ApiObject, ClassifiedObjects};
use crate::watch::{WatchAction, WatchEvent};
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Service};
use kube::runtime::reflector::{self, ObjectRef, Store};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

/// In-memory client for one resource type.
///
/// Reads are served from a reflector [`Store`]; writes go through the matching
/// [`reflector::store::Writer`] and are published to subscribers.
pub struct ResourceClient<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    reader: Store<K>,
    writer: Arc<Mutex<reflector::store::Writer<K>>>,
    events: broadcast::Sender<WatchEvent>,
}

impl<K> Clone for ResourceClient<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            writer: self.writer.clone(),
            events: self.events.clone(),
        }
    }
}

impl<K> ResourceClient<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    /// Build a client whose store already contains `objects`.
    ///
    /// Seeding does not publish events; subscribers only see later writes.
    pub fn seeded(
        objects: impl IntoIterator<Item = K>,
        events: broadcast::Sender<WatchEvent>,
    ) -> Self {
        let (reader, mut writer) = reflector::store::<K>();
        for object in objects {
            writer.apply_watcher_event(&watcher::Event::Apply(object));
        }
        Self {
            reader,
            writer: Arc::new(Mutex::new(writer)),
            events,
        }
    }

    fn writer(&self) -> MutexGuard<'_, reflector::store::Writer<K>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn object_ref(name: &str, namespace: Option<&str>) -> ObjectRef<K> {
        let object_ref = ObjectRef::new(name);
        match namespace {
            Some(ns) => object_ref.within(ns),
            None => object_ref,
        }
    }

    #[must_use]
    pub fn list(&self) -> Vec<Arc<K>> {
        self.reader.state()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reader.state().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an object by name (and namespace, for namespaced kinds).
    #[must_use]
    pub fn get(&self, name: &str, namespace: Option<&str>) -> Option<Arc<K>> {
        self.reader.get(&Self::object_ref(name, namespace))
    }

    /// Create or replace an object.
    pub fn apply(&self, object: K) {
        let action = if self.reader.get(&ObjectRef::from_obj(&object)).is_some() {
            WatchAction::Updated
        } else {
            WatchAction::Added
        };
        let event = WatchEvent::for_object(&object, action);
        self.writer()
            .apply_watcher_event(&watcher::Event::Apply(object));
        self.publish(event);
    }

    /// Remove an object.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no such object exists.
    pub fn delete(&self, name: &str, namespace: Option<&str>) -> Result<(), ClientError> {
        let existing = self
            .get(name, namespace)
            .ok_or_else(|| ClientError::NotFound {
                kind: K::kind(&()).to_string(),
                name: match namespace {
                    Some(ns) => format!("{ns}/{name}"),
                    None => name.to_string(),
                },
            })?;
        let object = (*existing).clone();
        let event = WatchEvent::for_object(&object, WatchAction::Deleted);
        self.writer()
            .apply_watcher_event(&watcher::Event::Delete(object));
        self.publish(event);
        Ok(())
    }

    fn publish(&self, event: WatchEvent) {
        // No subscribers yet is normal before delivery starts
        if self.events.send(event.clone()).is_err() {
            debug!(kind = %event.kind, key = %event.key, "No watch subscribers for event");
        }
    }
}

/// Client for core (v1) objects plus whatever the classifier routed to the core bucket
/// without a typed store.
#[derive(Clone)]
pub struct CoreClient {
    pub nodes: ResourceClient<Node>,
    pub namespaces: ResourceClient<Namespace>,
    pub pods: ResourceClient<Pod>,
    pub services: ResourceClient<Service>,
    unstructured: Arc<Vec<ApiObject>>,
}

impl CoreClient {
    fn seeded(core: &[ApiObject], events: &broadcast::Sender<WatchEvent>) -> Self {
        let mut nodes = Vec::new();
        let mut namespaces = Vec::new();
        let mut pods = Vec::new();
        let mut services = Vec::new();
        let mut unstructured = Vec::new();
        for object in core {
            match object {
                ApiObject::Node(node) => nodes.push(node.clone()),
                ApiObject::Namespace(ns) => namespaces.push(ns.clone()),
                ApiObject::Pod(pod) => pods.push(pod.clone()),
                ApiObject::Service(svc) => services.push(svc.clone()),
                other => unstructured.push(other.clone()),
            }
        }
        Self {
            nodes: ResourceClient::seeded(nodes, events.clone()),
            namespaces: ResourceClient::seeded(namespaces, events.clone()),
            pods: ResourceClient::seeded(pods, events.clone()),
            services: ResourceClient::seeded(services, events.clone()),
            unstructured: Arc::new(unstructured),
        }
    }

    /// Core-bucket objects that have no typed store.
    #[must_use]
    pub fn unstructured(&self) -> &[ApiObject] {
        &self.unstructured
    }
}

/// One client per API group, seeded from a classified object batch.
pub struct ClientBundle {
    pub core: CoreClient,
    pub egress_ips: ResourceClient<EgressIP>,
    pub egress_firewalls: ResourceClient<EgressFirewall>,
    pub egress_qos: ResourceClient<EgressQoS>,
    pub multi_network_policies: ResourceClient<MultiNetworkPolicy>,
    pub egress_services: ResourceClient<EgressService>,
    pub admin_policy_routes: ResourceClient<AdminPolicyBasedExternalRoute>,
    pub admin_network_policies: ResourceClient<AdminNetworkPolicy>,
    pub network_attachment_definitions: ResourceClient<NetworkAttachmentDefinition>,
    events: broadcast::Sender<WatchEvent>,
}

fn flatten<T: Clone>(lists: &[ResourceList<T>]) -> Vec<T> {
    lists.iter().flat_map(|list| list.items.iter().cloned()).collect()
}

impl ClientBundle {
    /// Seed every group client from its bucket.
    #[must_use]
    pub fn seed(classified: &ClassifiedObjects) -> Self {
        let (events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        let bundle = Self {
            core: CoreClient::seeded(&classified.core, &events),
            egress_ips: ResourceClient::seeded(flatten(&classified.egress_ips), events.clone()),
            egress_firewalls: ResourceClient::seeded(
                flatten(&classified.egress_firewalls),
                events.clone(),
            ),
            egress_qos: ResourceClient::seeded(flatten(&classified.egress_qos), events.clone()),
            multi_network_policies: ResourceClient::seeded(
                flatten(&classified.multi_network_policies),
                events.clone(),
            ),
            egress_services: ResourceClient::seeded(
                flatten(&classified.egress_services),
                events.clone(),
            ),
            admin_policy_routes: ResourceClient::seeded(
                flatten(&classified.admin_policy_routes),
                events.clone(),
            ),
            admin_network_policies: ResourceClient::seeded(
                flatten(&classified.admin_network_policies),
                events.clone(),
            ),
            network_attachment_definitions: ResourceClient::seeded(
                classified.network_attachment_definitions.iter().cloned(),
                events.clone(),
            ),
            events,
        };
        debug!(
            nodes = bundle.core.nodes.len(),
            egress_ips = bundle.egress_ips.len(),
            nads = bundle.network_attachment_definitions.len(),
            "Seeded client bundle"
        );
        bundle
    }

    /// Receive every write made through any client of this bundle.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }

    /// Combined view used by controllers.
    #[must_use]
    pub fn kube(&self) -> KubeFacade {
        KubeFacade {
            core: self.core.clone(),
            egress_ips: self.egress_ips.clone(),
            egress_firewalls: self.egress_firewalls.clone(),
            egress_services: self.egress_services.clone(),
            admin_policy_routes: self.admin_policy_routes.clone(),
            admin_network_policies: self.admin_network_policies.clone(),
        }
    }
}

/// Combined client facade handed to controllers.
#[derive(Clone)]
pub struct KubeFacade {
    pub core: CoreClient,
    pub egress_ips: ResourceClient<EgressIP>,
    pub egress_firewalls: ResourceClient<EgressFirewall>,
    pub egress_services: ResourceClient<EgressService>,
    pub admin_policy_routes: ResourceClient<AdminPolicyBasedExternalRoute>,
    pub admin_network_policies: ResourceClient<AdminNetworkPolicy>,
}

impl KubeFacade {
    /// All nodes currently known to the cluster.
    ///
    /// # Errors
    ///
    /// Never fails for the in-memory client; callers treat failure as non-fatal.
    pub fn get_nodes(&self) -> Result<Vec<Arc<Node>>, ClientError> {
        Ok(self.core.nodes.list())
    }

    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the egress IP does not exist.
    pub fn get_egress_ip(&self, name: &str) -> Result<Arc<EgressIP>, ClientError> {
        self.egress_ips
            .get(name, None)
            .ok_or_else(|| ClientError::NotFound {
                kind: "EgressIP".to_string(),
                name: name.to_string(),
            })
    }

    /// Replace an egress IP's status wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the egress IP does not exist.
    pub fn update_egress_ip_status(
        &self,
        name: &str,
        status: EgressIPStatus,
    ) -> Result<(), ClientError> {
        let mut egress_ip = (*self.get_egress_ip(name)?).clone();
        debug!(
            egress_ip = %egress_ip.name_any(),
            items = status.items.len(),
            "Replacing EgressIP status"
        );
        egress_ip.status = Some(status);
        self.egress_ips.apply(egress_ip);
        Ok(())
    }
}

#[cfg(test)]
#[path = "clients_tests.rs"]
mod clients_tests;
