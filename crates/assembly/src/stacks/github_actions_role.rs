//! Role assumable from CI workflows through OIDC federation.

use tracing::info;
use trust::{RoleName, TrustPolicyBuilder, TrustPolicyInput};

use crate::iam::{FederationSettings, TrustPolicyDocument};
use crate::resource::{OidcProvider, Role};
use crate::{AssemblyError, Expr, Resource, Stack};

/// Inputs for [`GithubActionsRole::declare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubActionsRoleProps {
    /// Physical role name; generated when `None`.
    pub role_name: Option<RoleName>,
    /// Existing provider to trust. A new provider is declared when `None`.
    pub oidc_provider_arn: Option<String>,
    /// Repositories and branches allowed to assume the role.
    pub repositories: TrustPolicyInput,
    /// Issuer, audience, and claim constants.
    pub federation: FederationSettings,
}

/// Handles to the resources declared for the CI role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubActionsRole {
    /// Reference to the role.
    pub role: Expr,
    /// The trusted provider (a literal ARN or a reference).
    pub provider: Expr,
}

impl GithubActionsRole {
    /// Declares the role (and, unless one is supplied, the OIDC provider) in
    /// `stack`, prefixing logical ids with `id`.
    ///
    /// The repositories are validated before anything is registered, so on
    /// error `stack` is left exactly as it was.
    pub fn declare(
        stack: &mut Stack,
        id: &str,
        props: &GithubActionsRoleProps,
    ) -> Result<Self, AssemblyError> {
        let subjects = TrustPolicyBuilder::build(&props.repositories)?;

        let provider = match &props.oidc_provider_arn {
            Some(arn) => Expr::literal(arn.as_str()),
            None => stack.add(
                &format!("{id}OpenIdConnectProvider"),
                Resource::OidcProvider(OidcProvider {
                    url: props.federation.issuer_url.clone(),
                    client_ids: vec![props.federation.audience.clone()],
                }),
            )?
            .to_expr(),
        };

        info!(
            subjects = subjects.len(),
            existing_provider = props.oidc_provider_arn.is_some(),
            "Declaring CI role"
        );
        let document = TrustPolicyDocument::new(provider.clone(), subjects, &props.federation);
        let role = stack.add(
            &format!("{id}Role"),
            Resource::Role(Role {
                role_name: props.role_name.clone(),
                assume_role_policy: document,
            }),
        )?
        .to_expr();

        Ok(Self { role, provider })
    }
}
