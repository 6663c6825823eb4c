pub mod html;
pub mod photos;

pub(super) fn mount(app: &mut tide::Server<crate::State>) {
    html::mount(app);
    photos::mount(app);
}
