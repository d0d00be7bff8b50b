use crate::application::services::{CompletionRefresher, OperationQueue};
use crate::application::use_cases::*;
use crate::domain::repositories::{CatalogRepository, PackageRepository, PackageStatusRepository};
use std::sync::Arc;

pub struct UseCaseContainer {
    pub queue: Arc<OperationQueue>,
    /// Present when catalog refresh after successful actions is enabled.
    pub refresher: Option<Arc<CompletionRefresher>>,
    pub check_tool: Arc<CheckToolInstalled>,
    pub resolve_status: Arc<ResolvePackageStatus>,
    pub get_details: Arc<GetPackageDetails>,
    pub refresh_catalog: Arc<RefreshCatalog>,
    pub refresh_package: Arc<RefreshCatalogPackage>,
    pub filter_catalog: Arc<FilterCatalog>,
    pub add_custom: Arc<AddCustomPackage>,
    pub remove_custom: Arc<RemoveCustomPackage>,
    pub enqueue: Arc<EnqueueOperation>,
    pub enqueue_selected: Arc<EnqueueSelected>,
    pub cancel: Arc<CancelOperation>,
}

impl UseCaseContainer {
    /// Starts the queue worker, so this must run inside a tokio runtime.
    pub fn new(
        status_repository: Arc<dyn PackageStatusRepository>,
        package_repository: Arc<dyn PackageRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
        refresh_on_completion: bool,
    ) -> Self {
        let queue = Arc::new(OperationQueue::new(package_repository));
        let refresh_package = Arc::new(RefreshCatalogPackage::new(
            Arc::clone(&status_repository),
            Arc::clone(&catalog_repository),
        ));
        let refresher = refresh_on_completion.then(|| {
            let refresher = Arc::new(CompletionRefresher::new(Arc::clone(&refresh_package)));
            refresher.attach(&queue);
            refresher
        });

        Self {
            check_tool: Arc::new(CheckToolInstalled::new(Arc::clone(&status_repository))),
            resolve_status: Arc::new(ResolvePackageStatus::new(Arc::clone(&status_repository))),
            get_details: Arc::new(GetPackageDetails::new(Arc::clone(&status_repository))),
            refresh_catalog: Arc::new(RefreshCatalog::new(
                Arc::clone(&status_repository),
                Arc::clone(&catalog_repository),
            )),
            refresh_package,
            filter_catalog: Arc::new(FilterCatalog::new(Arc::clone(&catalog_repository))),
            add_custom: Arc::new(AddCustomPackage::new(Arc::clone(&catalog_repository))),
            remove_custom: Arc::new(RemoveCustomPackage::new(Arc::clone(&catalog_repository))),
            enqueue: Arc::new(EnqueueOperation::new(Arc::clone(&queue))),
            enqueue_selected: Arc::new(EnqueueSelected::new(Arc::clone(&queue))),
            cancel: Arc::new(CancelOperation::new(Arc::clone(&queue))),
            queue,
            refresher,
        }
    }
}
