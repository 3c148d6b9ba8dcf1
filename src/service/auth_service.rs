use std::{sync::Arc, time::Duration};

use tracing::{debug, info, instrument};

use crate::{
    auth::{
        jwt::{generate_access_token, rejection_message, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::{employee::Employee, role::Role},
    models::{AuthSession, RegisterReqDto},
    store::{EmployeeStore, NewEmployee},
    utils::{email_filter::EmailFilter, employee_cache::EmployeeCache},
};

pub struct AuthService {
    employees: Arc<dyn EmployeeStore>,
    email_filter: EmailFilter,
    cache: EmployeeCache,
    jwt_secret: String,
    token_ttl: usize,
}

impl AuthService {
    pub fn new(employees: Arc<dyn EmployeeStore>, config: &Config) -> Self {
        Self {
            employees,
            email_filter: EmailFilter::default(),
            cache: EmployeeCache::new(Duration::from_secs(config.employee_cache_ttl_secs)),
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: config.access_token_ttl,
        }
    }

    /// Loads every registered email into the filter.
    pub async fn warmup_email_filter(&self) -> Result<usize, AppError> {
        let emails = self.employees.all_emails().await?;
        let total = self.email_filter.insert_batch(&emails);
        info!("Email filter warmup complete: {} employees", total);
        Ok(total)
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    async fn is_email_available(&self, email: &str) -> Result<bool, AppError> {
        // Cuckoo filter: a miss is definitive
        if !self.email_filter.might_exist(email) {
            return Ok(true);
        }

        Ok(self.employees.find_by_email(email).await?.is_none())
    }

    #[instrument(name = "auth_register", skip(self, dto), fields(email = %dto.email))]
    pub async fn register(&self, dto: RegisterReqDto) -> Result<AuthSession, AppError> {
        dto.validate()?;

        let email = dto.email.trim().to_lowercase();

        if !self.is_email_available(&email).await? {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        if let Some(manager_id) = dto.manager_id {
            match self.employees.find_by_id(manager_id).await? {
                Some(manager) if manager.role.is_manager() => {}
                _ => return Err(AppError::Validation("Manager not found".into())),
            }
        }

        let password_hash = hash_password(&dto.password)?;

        let employee = self
            .employees
            .create(NewEmployee {
                email,
                password_hash,
                full_name: dto.full_name.trim().to_string(),
                role: dto.role.unwrap_or_default(),
                manager_id: dto.manager_id,
            })
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
                other => other,
            })?;

        self.email_filter.insert(&employee.email);
        info!(employee_id = employee.id, "Employee registered");

        self.session(employee)
    }

    #[instrument(name = "auth_login", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let email = email.trim().to_lowercase();

        let employee = match self.employees.find_by_email(&email).await? {
            Some(employee) => employee,
            None => {
                info!("Invalid credentials: employee not found");
                return Err(AppError::Unauthorized("Invalid credentials".into()));
            }
        };

        if let Err(e) = verify_password(password, &employee.password_hash) {
            info!(error = %e, "Invalid credentials: password mismatch");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        info!(employee_id = employee.id, "Employee logged in");
        self.session(employee)
    }

    /// Resolves a bearer token to the employee it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<Employee, AppError> {
        let claims = verify_token(token, &self.jwt_secret).map_err(|e| {
            debug!(error = %e, "Token rejected");
            AppError::Unauthorized(rejection_message(&e).into())
        })?;

        if let Some(employee) = self.cache.get(claims.employee_id).await {
            return Ok(employee);
        }

        let employee = self
            .employees
            .find_by_id(claims.employee_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        self.cache.insert(employee.clone()).await;
        Ok(employee)
    }

    pub fn issue_token(&self, employee_id: u64, email: &str, role: Role) -> Result<String, AppError> {
        Ok(generate_access_token(
            employee_id,
            email.to_string(),
            role,
            &self.jwt_secret,
            self.token_ttl,
        )?)
    }

    fn session(&self, employee: Employee) -> Result<AuthSession, AppError> {
        let token = self.issue_token(employee.id, &employee.email, employee.role)?;
        Ok(AuthSession { employee, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::memory::MemoryStore, test_support::test_config};

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AuthService::new(store.clone(), &test_config()), store)
    }

    fn dto(email: &str, role: Option<Role>, manager_id: Option<u64>) -> RegisterReqDto {
        RegisterReqDto {
            email: email.into(),
            password: "s3cret-pass".into(),
            full_name: "Some Body".into(),
            role,
            manager_id,
        }
    }

    #[actix_web::test]
    async fn register_then_login_and_authenticate() {
        let (auth, _) = service();

        let boss = auth
            .register(dto("Boss@Corp.io", Some(Role::Manager), None))
            .await
            .unwrap();
        assert_eq!(boss.employee.email, "boss@corp.io");
        assert_eq!(boss.employee.role, Role::Manager);

        let session = auth.login("boss@corp.io", "s3cret-pass").await.unwrap();
        assert_eq!(session.employee.id, boss.employee.id);

        let me = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(me.id, boss.employee.id);
    }

    #[actix_web::test]
    async fn duplicate_email_conflicts() {
        let (auth, _) = service();
        auth.register(dto("a@corp.io", None, None)).await.unwrap();

        let err = auth.register(dto("A@corp.io", None, None)).await.err().unwrap();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn warmed_filter_still_defers_to_store() {
        let (auth, store) = service();
        EmployeeStore::create(
            store.as_ref(),
            NewEmployee {
                email: "seeded@corp.io".into(),
                password_hash: "x".into(),
                full_name: "Seeded".into(),
                role: Role::Employee,
                manager_id: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(auth.warmup_email_filter().await.unwrap(), 1);
        assert!(!auth.is_email_available("seeded@corp.io").await.unwrap());
        assert!(auth.is_email_available("fresh@corp.io").await.unwrap());
    }

    #[actix_web::test]
    async fn manager_reference_must_be_a_manager() {
        let (auth, _) = service();
        let plain = auth.register(dto("plain@corp.io", None, None)).await.unwrap();

        let err = auth
            .register(dto("report@corp.io", None, Some(plain.employee.id)))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation(_)));

        let err = auth
            .register(dto("ghost@corp.io", None, Some(999)))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[actix_web::test]
    async fn bad_credentials_are_unauthorized() {
        let (auth, _) = service();
        auth.register(dto("a@corp.io", None, None)).await.unwrap();

        assert!(matches!(
            auth.login("a@corp.io", "wrong-pass").await.err().unwrap(),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            auth.login("nobody@corp.io", "s3cret-pass").await.err().unwrap(),
            AppError::Unauthorized(_)
        ));
    }

    #[actix_web::test]
    async fn token_for_unknown_employee_is_rejected() {
        let (auth, _) = service();
        let token = auth.issue_token(404, "gone@corp.io", Role::Employee).unwrap();

        assert!(matches!(
            auth.authenticate(&token).await.err().unwrap(),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            auth.authenticate("garbage").await.err().unwrap(),
            AppError::Unauthorized(_)
        ));
    }
}
