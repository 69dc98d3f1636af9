//! # Service registry - ordered, type-keyed store of services.
//!
//! Services are registered during the build phase and keyed by their concrete type.
//! Later services obtain earlier ones through [`ServiceRegistry::fetch`].
//!
//! ## Architecture
//! ```text
//! register::<P2p>()  ──►  order: [P2p]            services: {TypeId(P2p) → Entry}
//! register::<Rpc>()  ──►  order: [P2p, Rpc]       services: {.., TypeId(Rpc) → Entry}
//! fetch::<Rpc>()     ──►  Entry.any.downcast::<Rpc>() → Arc<Rpc>
//!
//! start_all(): P2p.start() → Rpc.start() → ...          (registration order)
//! stop_all():  ... → Rpc.stop() → P2p.stop()            (reverse order)
//! ```
//!
//! ## Rules
//! - At most one service per type (`DuplicateService` otherwise, existing entry kept)
//! - Lookups never fabricate a value (`UnregisteredService` on miss)
//! - `start_all` / `stop_all` are best-effort: a failing service is published as a
//!   fault and the traversal continues
//! - No internal locking: mutation happens only during the build phase, traversal
//!   is serialized by the node's lifecycle lock

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{RegistryError, ServiceError};
use crate::events::{Bus, Event, EventKind};
use crate::services::{Service, ServiceRef};

/// A registered service, stored twice: as a trait object for lifecycle calls and as
/// `Any` for typed lookup.
struct Entry {
    name: Arc<str>,
    service: ServiceRef,
    any: Arc<dyn Any + Send + Sync>,
}

/// A start or stop failure collected during a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFault {
    /// Service name.
    pub service: Arc<str>,
    /// What went wrong.
    pub error: ServiceError,
}

/// Ordered, type-keyed registry of services.
pub struct ServiceRegistry {
    order: Vec<TypeId>,
    services: HashMap<TypeId, Entry>,
    bus: Bus,
}

impl ServiceRegistry {
    /// Creates an empty registry publishing to `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            order: Vec::new(),
            services: HashMap::new(),
            bus,
        }
    }

    /// Adds `service` under its concrete type. Does not start it.
    pub fn register<S: Service>(&mut self, service: Arc<S>) -> Result<(), RegistryError> {
        let key = TypeId::of::<S>();
        if self.services.contains_key(&key) {
            return Err(RegistryError::DuplicateService {
                service: type_name::<S>(),
            });
        }

        let name: Arc<str> = Arc::from(service.name());
        let entry = Entry {
            name: Arc::clone(&name),
            any: Arc::clone(&service) as Arc<dyn Any + Send + Sync>,
            service,
        };
        self.services.insert(key, entry);
        self.order.push(key);

        self.bus
            .publish(Event::new(EventKind::ServiceRegistered).with_service(name));
        Ok(())
    }

    /// Returns the registered service of type `S`.
    pub fn fetch<S: Service>(&self) -> Result<Arc<S>, RegistryError> {
        let missing = || RegistryError::UnregisteredService {
            service: type_name::<S>(),
        };
        let entry = self.services.get(&TypeId::of::<S>()).ok_or_else(missing)?;
        Arc::clone(&entry.any).downcast::<S>().map_err(|_| missing())
    }

    /// True if a service of type `S` is registered.
    pub fn contains<S: Service>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<S>())
    }

    /// Service names in registration order.
    pub fn names(&self) -> Vec<Arc<str>> {
        self.entries().map(|e| Arc::clone(&e.name)).collect()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Starts every service in registration order.
    ///
    /// Each `start` call returns before the next one is made. Failures are
    /// published as [`EventKind::ServiceStartFailed`] and returned; they do not
    /// prevent the remaining services from starting.
    pub fn start_all(&self) -> Vec<ServiceFault> {
        let mut faults = Vec::new();
        for entry in self.entries() {
            self.bus.publish(
                Event::new(EventKind::ServiceStarting).with_service(Arc::clone(&entry.name)),
            );

            match entry.service.start() {
                Ok(()) => {
                    self.bus.publish(
                        Event::new(EventKind::ServiceStarted).with_service(Arc::clone(&entry.name)),
                    );
                }
                Err(error) => {
                    self.bus.publish(
                        Event::new(EventKind::ServiceStartFailed)
                            .with_service(Arc::clone(&entry.name))
                            .with_reason(error.to_string()),
                    );
                    faults.push(ServiceFault {
                        service: Arc::clone(&entry.name),
                        error,
                    });
                }
            }
        }
        faults
    }

    /// Stops every service in reverse registration order (dependents first).
    ///
    /// With `timeout = Some(d)` each `stop` is bounded by `d`; an expired stop is
    /// recorded as [`ServiceError::StopTimeout`] and the traversal moves on.
    /// With `None` a hung `stop` stalls the traversal.
    pub async fn stop_all(&self, timeout: Option<Duration>) -> Vec<ServiceFault> {
        let mut faults = Vec::new();
        for entry in self.entries().rev() {
            let res = match timeout {
                Some(limit) => match tokio::time::timeout(limit, entry.service.stop()).await {
                    Ok(res) => res,
                    Err(_elapsed) => Err(ServiceError::StopTimeout { timeout: limit }),
                },
                None => entry.service.stop().await,
            };

            match res {
                Ok(()) => {
                    self.bus.publish(
                        Event::new(EventKind::ServiceStopped).with_service(Arc::clone(&entry.name)),
                    );
                }
                Err(error) => {
                    let mut ev = Event::new(EventKind::ServiceStopFailed)
                        .with_service(Arc::clone(&entry.name))
                        .with_reason(error.to_string());
                    if let ServiceError::StopTimeout { timeout } = &error {
                        ev = ev.with_timeout(*timeout);
                    }
                    self.bus.publish(ev);
                    faults.push(ServiceFault {
                        service: Arc::clone(&entry.name),
                        error,
                    });
                }
            }
        }
        faults
    }

    /// Entries in registration order.
    fn entries(&self) -> impl DoubleEndedIterator<Item = &Entry> {
        self.order.iter().filter_map(|key| self.services.get(key))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records every lifecycle call into a shared journal.
    struct Stub<const N: usize> {
        journal: Journal,
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_start: bool,
        hang_stop: bool,
    }

    impl<const N: usize> Stub<N> {
        fn new(journal: &Journal) -> Arc<Self> {
            Arc::new(Self {
                journal: Arc::clone(journal),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                fail_start: false,
                hang_stop: false,
            })
        }

        fn failing(journal: &Journal) -> Arc<Self> {
            Arc::new(Self {
                fail_start: true,
                ..Arc::into_inner(Self::new(journal)).unwrap()
            })
        }

        fn hanging(journal: &Journal) -> Arc<Self> {
            Arc::new(Self {
                hang_stop: true,
                ..Arc::into_inner(Self::new(journal)).unwrap()
            })
        }
    }

    #[async_trait]
    impl<const N: usize> Service for Stub<N> {
        fn name(&self) -> &str {
            ["a", "b", "c", "d"][N]
        }

        fn start(&self) -> Result<(), ServiceError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.journal.lock().push(format!("start {}", self.name()));
            if self.fail_start {
                return Err(ServiceError::start("boom"));
            }
            Ok(())
        }

        async fn stop(&self) -> Result<(), ServiceError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.journal.lock().push(format!("stop {}", self.name()));
            if self.hang_stop {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_fetch_preserves_identity() {
        let j = journal();
        let mut reg = ServiceRegistry::new(Bus::new(16));
        let a = Stub::<0>::new(&j);
        let b = Stub::<1>::new(&j);
        reg.register(Arc::clone(&a)).unwrap();
        reg.register(Arc::clone(&b)).unwrap();

        assert!(Arc::ptr_eq(&reg.fetch::<Stub<0>>().unwrap(), &a));
        assert!(Arc::ptr_eq(&reg.fetch::<Stub<1>>().unwrap(), &b));
        let names: Vec<Arc<str>> = reg.names();
        assert_eq!(names.iter().map(|n| &**n).collect::<Vec<&str>>(), ["a", "b"]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_duplicate_keeps_existing_entry() {
        let j = journal();
        let mut reg = ServiceRegistry::new(Bus::new(16));
        let first = Stub::<0>::new(&j);
        reg.register(Arc::clone(&first)).unwrap();

        let err = reg.register(Stub::<0>::new(&j)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateService { .. }));
        assert!(Arc::ptr_eq(&reg.fetch::<Stub<0>>().unwrap(), &first));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unregistered_fetch_has_no_side_effect() {
        let j = journal();
        let mut reg = ServiceRegistry::new(Bus::new(16));
        reg.register(Stub::<0>::new(&j)).unwrap();

        assert!(matches!(
            reg.fetch::<Stub<1>>(),
            Err(RegistryError::UnregisteredService { .. })
        ));
        assert!(!reg.contains::<Stub<1>>());
        assert_eq!(reg.len(), 1);
        assert!(ServiceRegistry::new(Bus::new(1)).is_empty());
    }

    #[tokio::test]
    async fn test_best_effort_start_then_reverse_stop() {
        let j = journal();
        let mut reg = ServiceRegistry::new(Bus::new(16));
        let a = Stub::<0>::new(&j);
        let b = Stub::<1>::failing(&j);
        let c = Stub::<2>::new(&j);
        reg.register(Arc::clone(&a)).unwrap();
        reg.register(Arc::clone(&b)).unwrap();
        reg.register(Arc::clone(&c)).unwrap();

        let faults = reg.start_all();
        assert_eq!(faults.len(), 1);
        assert_eq!(&*faults[0].service, "b");

        let faults = reg.stop_all(None).await;
        assert!(faults.is_empty());

        assert_eq!(
            *j.lock(),
            ["start a", "start b", "start c", "stop c", "stop b", "stop a"]
        );
        for (starts, stops) in [
            (&a.starts, &a.stops),
            (&b.starts, &b.stops),
            (&c.starts, &c.stops),
        ] {
            assert_eq!(starts.load(Ordering::SeqCst), 1);
            assert_eq!(stops.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_timeout_moves_on() {
        let j = journal();
        let mut reg = ServiceRegistry::new(Bus::new(16));
        reg.register(Stub::<0>::new(&j)).unwrap();
        reg.register(Stub::<1>::hanging(&j)).unwrap();

        let faults = reg.stop_all(Some(Duration::from_secs(1))).await;
        assert_eq!(faults.len(), 1);
        assert_eq!(
            faults[0].error,
            ServiceError::StopTimeout {
                timeout: Duration::from_secs(1)
            }
        );
        assert_eq!(*j.lock(), ["stop b", "stop a"]);
    }

    #[tokio::test]
    async fn test_publishes_lifecycle_events() {
        let j = journal();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let mut reg = ServiceRegistry::new(bus);
        reg.register(Stub::<3>::failing(&j)).unwrap();
        reg.start_all();

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                EventKind::ServiceRegistered,
                EventKind::ServiceStarting,
                EventKind::ServiceStartFailed
            ]
        );
    }
}
