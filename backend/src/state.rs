use std::sync::Arc;

use crate::{
    config::Config,
    repositories::Repositories,
    services::{
        account::AccountService, activity_log::ActivityLogService, cart::CartService,
        checkout::CheckoutService, geo::GeoLocator, mailer::Mailer, voucher::VoucherService,
    },
    utils::data_protection::DataProtector,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repos: Repositories,
    pub protector: DataProtector,
    pub mailer: Arc<dyn Mailer>,
    pub geolocator: Arc<dyn GeoLocator>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        geolocator: Arc<dyn GeoLocator>,
    ) -> Self {
        let protector = DataProtector::new(&config.data_protection_key);
        Self {
            config,
            repos,
            protector,
            mailer,
            geolocator,
        }
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            self.repos.users.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    pub fn carts(&self) -> CartService {
        CartService::new(self.repos.carts.clone(), self.repos.products.clone())
    }

    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            self.repos.carts.clone(),
            self.repos.products.clone(),
            self.repos.transactions.clone(),
            self.protector.clone(),
        )
    }

    pub fn vouchers(&self) -> VoucherService {
        VoucherService::new(
            self.repos.vouchers.clone(),
            self.repos.users.clone(),
            self.config.user_voucher_validity_days,
        )
    }

    pub fn activity(&self) -> ActivityLogService {
        ActivityLogService::new(self.repos.activity_logs.clone(), self.geolocator.clone())
    }
}
