use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::application::compose::{ComposeError, FieldErrors, PostInput};
use crate::application::error::HttpError;
use crate::domain::entities::{PostRecord, UserRecord};
use crate::presentation::views::{
    FieldErrorsView, GroupChoice, LayoutContext, PostFormContext, PostFormTemplate,
    render_not_found_response, render_template_response,
};

use super::{HttpState, current_user, login_redirect, redirect_found, viewer_view};

pub(crate) async fn create_form(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let Some(user) = current_user(&state, &jar).await else {
        return login_redirect("/create/");
    };

    render_compose_form(
        &state,
        &user,
        FormTarget::Create,
        PostInput::default(),
        FieldErrors::default(),
        StatusCode::OK,
    )
    .await
}

pub(crate) async fn create_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<super::forms::PostForm>,
) -> Response {
    let Some(user) = current_user(&state, &jar).await else {
        return login_redirect("/create/");
    };

    let input = PostInput {
        text: form.text,
        group: form.group,
    };

    match state.compose.create_post(&user, input.clone()).await {
        Ok(_post) => redirect_found(&format!("/profile/{}/", user.username)),
        Err(ComposeError::Validation(errors)) => {
            render_compose_form(&state, &user, FormTarget::Create, input, errors, StatusCode::OK)
                .await
        }
        Err(err) => compose_error_response("infra::http::compose::create_submit", err),
    }
}

pub(crate) async fn edit_form(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Response {
    let user = current_user(&state, &jar).await;

    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response(viewer_view(&user));
    };

    let Some(user) = user else {
        return login_redirect(&format!("/posts/{id}/edit/"));
    };

    match state.compose.editable_post(&user, id).await {
        Ok(post) => {
            let input = prefill(&post);
            render_compose_form(
                &state,
                &user,
                FormTarget::Edit(id),
                input,
                FieldErrors::default(),
                StatusCode::OK,
            )
            .await
        }
        Err(ComposeError::NotFound) => render_not_found_response(viewer_view(&Some(user))),
        Err(ComposeError::NotAuthor) => redirect_found(&format!("/posts/{id}/")),
        Err(err) => compose_error_response("infra::http::compose::edit_form", err),
    }
}

pub(crate) async fn edit_submit(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    jar: CookieJar,
    Form(form): Form<super::forms::PostForm>,
) -> Response {
    let user = current_user(&state, &jar).await;

    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response(viewer_view(&user));
    };

    let Some(user) = user else {
        return login_redirect(&format!("/posts/{id}/edit/"));
    };

    let input = PostInput {
        text: form.text,
        group: form.group,
    };

    match state.compose.update_post(&user, id, input.clone()).await {
        Ok(post) => redirect_found(&format!("/posts/{}/", post.id)),
        Err(ComposeError::Validation(errors)) => {
            render_compose_form(
                &state,
                &user,
                FormTarget::Edit(id),
                input,
                errors,
                StatusCode::OK,
            )
            .await
        }
        Err(ComposeError::NotFound) => render_not_found_response(viewer_view(&Some(user))),
        Err(ComposeError::NotAuthor) => redirect_found(&format!("/posts/{id}/")),
        Err(err) => compose_error_response("infra::http::compose::edit_submit", err),
    }
}

#[derive(Clone, Copy)]
enum FormTarget {
    Create,
    Edit(i64),
}

impl FormTarget {
    fn action(self) -> String {
        match self {
            FormTarget::Create => "/create/".to_string(),
            FormTarget::Edit(id) => format!("/posts/{id}/edit/"),
        }
    }

    fn is_edit(self) -> bool {
        matches!(self, FormTarget::Edit(_))
    }
}

fn prefill(post: &PostRecord) -> PostInput {
    PostInput {
        text: post.body.clone(),
        group: post.group.as_ref().map(|group| group.id.to_string()),
    }
}

async fn render_compose_form(
    state: &HttpState,
    user: &UserRecord,
    target: FormTarget,
    input: PostInput,
    errors: FieldErrors,
    status: StatusCode,
) -> Response {
    let groups = match state.compose.group_choices().await {
        Ok(groups) => groups,
        Err(err) => {
            return compose_error_response("infra::http::compose::render_compose_form", err);
        }
    };

    let selected = input
        .group
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok());

    let choices = groups
        .into_iter()
        .map(|group| GroupChoice {
            selected: Some(group.id) == selected,
            id: group.id,
            title: group.title,
        })
        .collect();

    let content = PostFormContext {
        is_edit: target.is_edit(),
        action: target.action(),
        text: input.text,
        groups: choices,
        errors: FieldErrorsView {
            text: errors.text,
            group: errors.group,
        },
    };

    let view = LayoutContext::new(
        viewer_view(&Some(user.clone())),
        content,
    );
    render_template_response(PostFormTemplate { view }, status)
}

fn compose_error_response(source: &'static str, err: ComposeError) -> Response {
    HttpError::from_error(
        source,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        &err,
    )
    .into_response()
}
