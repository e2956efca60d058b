mod admin;
mod api_subscribe;
mod helpers;
mod subscribe;
