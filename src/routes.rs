use crate::{
    api::{fingerprint, qr, schedule},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(web::resource("/me").route(web::get().to(handlers::me))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance/qr")
                    .service(web::resource("/generate").route(web::post().to(qr::generate)))
                    .service(
                        web::resource("/auto-generate").route(web::post().to(qr::auto_generate)),
                    )
                    .service(web::resource("/active").route(web::get().to(qr::active)))
                    .service(web::resource("/check").route(web::post().to(qr::check))),
            )
            .service(
                web::scope("/fingerprint")
                    .service(web::resource("/import").route(web::post().to(fingerprint::import))),
            )
            .service(
                web::scope("/settings")
                    .service(
                        web::scope("/work-schedules")
                            .service(
                                web::resource("")
                                    .route(web::get().to(schedule::list_schedules))
                                    .route(web::post().to(schedule::create_schedule)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .route(web::put().to(schedule::update_schedule))
                                    .route(web::delete().to(schedule::delete_schedule)),
                            ),
                    )
                    .service(
                        web::scope("/work-schedule-assignments")
                            .service(
                                web::resource("")
                                    .route(web::get().to(schedule::list_assignments))
                                    .route(web::post().to(schedule::create_assignment)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .route(web::delete().to(schedule::delete_assignment)),
                            ),
                    )
                    .service(
                        web::scope("/special-days")
                            .service(
                                web::resource("")
                                    .route(web::get().to(schedule::list_special_days))
                                    .route(web::post().to(schedule::create_special_day)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .route(web::put().to(schedule::update_special_day))
                                    .route(web::delete().to(schedule::delete_special_day)),
                            ),
                    ),
            ),
    );
}
